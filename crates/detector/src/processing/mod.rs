pub mod decode;
pub mod nms;
