//! Word-cloud entry points for the server-rendered pages.

use echarts_bridge::{render_word_cloud, ChartError, WordCloudItem, WordCloudPreset};
use serde_json::Value;
use wasm_bindgen::prelude::*;

fn parse_items(data: JsValue) -> Result<Vec<WordCloudItem>, ChartError> {
    serde_wasm_bindgen::from_value(data).map_err(|e| ChartError::Js(format!("invalid word list: {}", e)))
}

fn parse_overrides(config: JsValue) -> Option<Value> {
    if config.is_undefined() || config.is_null() {
        return None;
    }
    match serde_wasm_bindgen::from_value(config) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring chart config: {}", e);
            None
        }
    }
}

pub fn render(element_id: &str, preset: WordCloudPreset, data: JsValue, config: JsValue) {
    let result = parse_items(data).and_then(|items| {
        let overrides = parse_overrides(config);
        render_word_cloud(element_id, preset, &items, overrides.as_ref())
    });
    match result {
        Ok(handle) => log::debug!("rendered #{}", handle.element_id()),
        Err(ChartError::MissingContainer(id)) => log::warn!("chart container #{} not found, skipping", id),
        Err(e) => log::error!("word cloud #{} failed: {}", element_id, e),
    }
}

/// `initWordCloud(elementId, data, config?)` for book overview pages.
#[wasm_bindgen(js_name = initWordCloud)]
pub fn init_word_cloud(element_id: &str, data: JsValue, config: JsValue) {
    render(element_id, WordCloudPreset::Overview, data, config);
}

/// `initUploadWordCloud(containerId, data)` for the upload detail page.
#[wasm_bindgen(js_name = initUploadWordCloud)]
pub fn init_upload_word_cloud(container_id: &str, data: JsValue) {
    render(container_id, WordCloudPreset::UploadDetail, data, JsValue::UNDEFINED);
}
