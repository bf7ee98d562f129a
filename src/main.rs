mod app;

use app::config::AppConfig;
use app::App;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    let config = AppConfig::from_window();
    wasm_logger::init(wasm_logger::Config::new(config.log_level()));
    log::info!("starting with api base {:?}", config.api_base);
    mount_to_body(move || view! { <App config=config /> })
}
