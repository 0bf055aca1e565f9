use log::{error, info};
use std::{fs, path::Path};

/// Creates the data folder (and parents) when missing, failures are logged and left to the db layer to surface
pub fn create_folder(root_path: &str) {
    let path = Path::new(root_path);

    if path.is_dir() {
        info!("folder already exists: {}", root_path);
        return;
    }

    match fs::create_dir_all(path) {
        Ok(()) => info!("folder created: {}", root_path),
        Err(err) => error!("error creating folder {}: {}", root_path, err),
    }
}
