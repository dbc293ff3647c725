pub(crate) mod user_controller;
