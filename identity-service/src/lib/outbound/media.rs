pub mod cloudinary;

pub use cloudinary::CloudinaryUploader;
