mod lines;

pub use self::lines::*;
