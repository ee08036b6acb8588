pub mod chassis;
pub mod grayscale;
pub mod hunt;
pub mod music;
pub mod operator_button;
pub mod resources;
pub mod servo;
pub mod ultrasonic;
pub mod vision_link;
