pub mod doctor;
pub mod enums;
pub mod specialty;

pub use doctor::*;
pub use enums::*;
pub use specialty::*;
