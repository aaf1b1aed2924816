use crate::error::Result;
use crate::settings::load_settings;
use crate::store;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let store_path = settings.default_store_path();

    println!("School:     {}", settings.school_name);
    println!("Uploads:    {}", settings.upload_dir().display());
    println!("Listen on:  {}", settings.bind);
    println!("Register:   {}", store_path.display());

    if store_path.exists() {
        let rows = store::read(&store_path)?;
        println!("Records:    {}", rows.len().saturating_sub(1));
    } else {
        println!();
        println!("Register not found. Run `feebook init` to set up.");
    }
    Ok(())
}
