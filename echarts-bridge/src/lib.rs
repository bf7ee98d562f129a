//! Word-cloud charts on top of the global `echarts` object.
//!
//! The page must load ECharts and the `echarts-wordcloud` extension. Option
//! building is plain `serde_json` so it can be checked without a browser.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use js_sys::{Function, Reflect};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

thread_local! {
    static INSTANCES: RefCell<HashMap<String, JsValue>> = RefCell::new(HashMap::new());
    static RESIZE_BOUND: Cell<bool> = const { Cell::new(false) };
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no browser window")]
    NoWindow,
    #[error("chart container #{0} not found")]
    MissingContainer(String),
    #[error("echarts is not loaded")]
    LibraryMissing,
    #[error("echarts call failed: {0}")]
    Js(String),
}

impl From<JsValue> for ChartError {
    fn from(value: JsValue) -> Self {
        ChartError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordCloudItem {
    pub name: String,
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordCloudPreset {
    /// Book overview pages.
    Overview,
    /// Upload detail page: larger words, tooltip, layout animation.
    UploadDetail,
}

impl WordCloudPreset {
    fn series(&self) -> Value {
        let mut series = json!({
            "type": "wordCloud",
            "shape": "circle",
            "width": "90%",
            "height": "90%",
            "rotationStep": 45,
            "gridSize": 8,
            "drawOutOfBound": false,
            "textStyle": { "fontFamily": "sans-serif", "fontWeight": "bold" },
            "emphasis": {
                "focus": "self",
                "textStyle": { "shadowBlur": 10, "shadowColor": "#333" }
            }
        });
        let extra = match self {
            WordCloudPreset::Overview => json!({
                "left": "center",
                "top": "center",
                "right": null,
                "bottom": null,
                "sizeRange": [12, 60],
                "rotationRange": [-90, 90]
            }),
            WordCloudPreset::UploadDetail => json!({
                "sizeRange": [14, 80],
                "rotationRange": [-45, 45],
                "layoutAnimation": true
            }),
        };
        merge_json(&mut series, &extra);
        series
    }

    fn has_tooltip(&self) -> bool {
        matches!(self, WordCloudPreset::UploadDetail)
    }
}

/// Deep-merges `overrides` into `base`. Objects merge key by key; any other
/// value replaces what was there.
pub fn merge_json(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(over_map)) => {
            for (key, value) in over_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// Full chart option. Caller overrides apply to the word-cloud series.
pub fn word_cloud_option(preset: WordCloudPreset, data: &[WordCloudItem], overrides: Option<&Value>) -> Value {
    let mut series = preset.series();
    if let Some(overrides) = overrides {
        merge_json(&mut series, overrides);
    }
    series["data"] = json!(data);

    let mut option = json!({ "series": [series] });
    if preset.has_tooltip() {
        option["tooltip"] = json!({ "show": true });
    }
    option
}

/// True when the caller set its own word colour, which then replaces the
/// random palette.
pub fn has_custom_color(option: &Value) -> bool {
    !option["series"][0]["textStyle"]["color"].is_null()
}

/// A live chart bound to a container element.
#[derive(Clone, Debug)]
pub struct ChartHandle {
    element_id: String,
    instance: JsValue,
}

impl ChartHandle {
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn resize(&self) {
        if let Err(e) = call_method(&self.instance, "resize", &[]) {
            log::warn!("[chart] resize of #{} failed: {}", self.element_id, e);
        }
    }

    pub fn dispose(self) {
        INSTANCES.with(|map| map.borrow_mut().remove(&self.element_id));
        let _ = call_method(&self.instance, "dispose", &[]);
    }
}

/// Initialises a word cloud in `#element_id`, replacing any chart already there.
pub fn render_word_cloud(
    element_id: &str,
    preset: WordCloudPreset,
    data: &[WordCloudItem],
    overrides: Option<&Value>,
) -> Result<ChartHandle, ChartError> {
    let window = web_sys::window().ok_or(ChartError::NoWindow)?;
    let document = window.document().ok_or(ChartError::NoWindow)?;
    let container = document
        .get_element_by_id(element_id)
        .ok_or_else(|| ChartError::MissingContainer(element_id.to_string()))?;

    let echarts = Reflect::get(&js_sys::global(), &JsValue::from_str("echarts"))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
        .ok_or(ChartError::LibraryMissing)?;

    if let Some(previous) = INSTANCES.with(|map| map.borrow_mut().remove(element_id)) {
        let _ = call_method(&previous, "dispose", &[]);
    }
    // Charts created by page scripts are not in the registry.
    if let Ok(existing) = call_method(&echarts, "getInstanceByDom", &[container.clone().into()]) {
        if !existing.is_undefined() && !existing.is_null() {
            let _ = call_method(&existing, "dispose", &[]);
        }
    }

    let instance = call_method(&echarts, "init", &[container.into()])?;
    let option = word_cloud_option(preset, data, overrides);
    let random_color = !has_custom_color(&option);
    let option = to_js_option(&option)?;
    install_callbacks(&option, preset, random_color)?;
    call_method(&instance, "setOption", &[option])?;

    INSTANCES.with(|map| map.borrow_mut().insert(element_id.to_string(), instance.clone()));
    bind_resize(&window);
    log::debug!("[chart] word cloud #{} with {} words", element_id, data.len());

    Ok(ChartHandle { element_id: element_id.to_string(), instance })
}

/// Re-lays out every registered chart.
pub fn resize_all() {
    INSTANCES.with(|map| {
        for (id, instance) in map.borrow().iter() {
            if let Err(e) = call_method(instance, "resize", &[]) {
                log::warn!("[chart] resize of #{} failed: {}", id, e);
            }
        }
    });
}

fn bind_resize(window: &web_sys::Window) {
    if RESIZE_BOUND.with(|bound| bound.replace(true)) {
        return;
    }
    let on_resize = Closure::<dyn FnMut(_)>::new(move |_ev: web_sys::Event| resize_all());
    let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
    on_resize.forget();
}

fn to_js_option(option: &Value) -> Result<JsValue, ChartError> {
    option
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ChartError::Js(e.to_string()))
}

fn install_callbacks(option: &JsValue, preset: WordCloudPreset, random_color: bool) -> Result<(), ChartError> {
    if random_color {
        let series = Reflect::get(option, &"series".into())?;
        let first = Reflect::get_u32(&series, 0)?;
        let text_style = Reflect::get(&first, &"textStyle".into())?;
        let color = Function::new_no_args(
            "return 'rgb(' + [Math.round(Math.random() * 160), Math.round(Math.random() * 160), Math.round(Math.random() * 160)].join(',') + ')';",
        );
        Reflect::set(&text_style, &"color".into(), &color)?;
    }

    if preset.has_tooltip() {
        let tooltip = Reflect::get(option, &"tooltip".into())?;
        let formatter = Function::new_with_args("params", "return params.data.name + ': ' + Math.round(params.data.value);");
        Reflect::set(&tooltip, &"formatter".into(), &formatter)?;
    }
    Ok(())
}

fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, ChartError> {
    let func: Function = Reflect::get(target, &JsValue::from_str(name))?
        .dyn_into()
        .map_err(|_| ChartError::Js(format!("{} is not a function", name)))?;
    let args: js_sys::Array = args.iter().collect();
    Ok(func.apply(target, &args)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words() -> Vec<WordCloudItem> {
        vec![
            WordCloudItem { name: "plot".into(), value: 12.0 },
            WordCloudItem { name: "characters".into(), value: 7.5 },
        ]
    }

    #[test]
    fn overview_preset_defaults() {
        let option = word_cloud_option(WordCloudPreset::Overview, &words(), None);
        let series = &option["series"][0];
        assert_eq!(series["type"], json!("wordCloud"));
        assert_eq!(series["sizeRange"], json!([12, 60]));
        assert_eq!(series["rotationRange"], json!([-90, 90]));
        assert_eq!(series["data"][1]["name"], json!("characters"));
        assert!(option.get("tooltip").is_none());
    }

    #[test]
    fn upload_detail_preset_has_tooltip_and_animation() {
        let option = word_cloud_option(WordCloudPreset::UploadDetail, &[], None);
        assert_eq!(option["tooltip"]["show"], json!(true));
        assert_eq!(option["series"][0]["layoutAnimation"], json!(true));
        assert_eq!(option["series"][0]["sizeRange"], json!([14, 80]));
        assert_eq!(option["series"][0]["data"], json!([]));
    }

    #[test]
    fn overrides_merge_into_series_without_dropping_defaults() {
        let overrides = json!({
            "shape": "diamond",
            "sizeRange": [10, 40],
            "textStyle": { "fontFamily": "serif" }
        });
        let option = word_cloud_option(WordCloudPreset::Overview, &words(), Some(&overrides));
        let series = &option["series"][0];
        assert_eq!(series["shape"], json!("diamond"));
        assert_eq!(series["sizeRange"], json!([10, 40]));
        assert_eq!(series["textStyle"], json!({ "fontFamily": "serif", "fontWeight": "bold" }));
        assert_eq!(series["gridSize"], json!(8));
    }

    #[test]
    fn caller_color_is_kept_over_the_random_palette() {
        assert!(!has_custom_color(&word_cloud_option(WordCloudPreset::Overview, &words(), None)));

        let overrides = json!({ "textStyle": { "color": "#333" } });
        let option = word_cloud_option(WordCloudPreset::UploadDetail, &words(), Some(&overrides));
        assert_eq!(option["series"][0]["textStyle"]["color"], json!("#333"));
        assert_eq!(option["series"][0]["textStyle"]["fontWeight"], json!("bold"));
        assert!(has_custom_color(&option));
    }

    #[test]
    fn merge_replaces_non_objects() {
        let mut base = json!({ "a": { "b": 1, "c": [1, 2] }, "d": "x" });
        merge_json(&mut base, &json!({ "a": { "c": [3] }, "d": { "e": true } }));
        assert_eq!(base, json!({ "a": { "b": 1, "c": [3] }, "d": { "e": true } }));
    }
}
