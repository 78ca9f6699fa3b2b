pub mod design;
pub mod doctor;
pub mod init;
pub mod materials;
pub mod prompt;
