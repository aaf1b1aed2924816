use crate::error::Result;
use crate::models::HEADER;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    std::fs::create_dir_all(settings.upload_dir())?;
    let store_path = settings.default_store_path();
    if store::create(&store_path, &HEADER)? {
        println!("Created fee register {}", store_path.display());
    } else {
        println!("Fee register already exists at {}", store_path.display());
    }
    println!("Initialized feebook at {}", settings.upload_dir().display());
    Ok(())
}
