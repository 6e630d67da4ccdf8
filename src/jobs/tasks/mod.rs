mod picture_cleanup;

pub use picture_cleanup::PictureCleanupTask;
