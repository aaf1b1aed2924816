use crate::error::Result;
use crate::settings::load_settings;
use crate::web;

pub fn run(bind: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(bind) = bind {
        settings.bind = bind;
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(settings))
}
