//! # Resource Loader
//!
//! Loads resources for the [`ResourceCache`](crate::engine_state::resources::ResourceCache)
//! without blocking the editor:
//! - Natively, files are read from the asset directory and the load is driven to
//!   completion with `pollster`
//! - On the web, files are fetched with `reqwest` from the page's origin inside a
//!   `wasm_bindgen_futures` task
//!
//! Either way the result is handed back to the event loop as an
//! [`EditorEvent::ResourceLoaded`], so the cache is only ever touched from the
//! event loop thread.

use std::future::Future;

use winit::event_loop::EventLoopProxy;

use crate::engine_state::resources::{self, ResourceError, ResourceKey};

use super::EditorEvent;

/// Starts resource loads and reports them to the event loop.
pub struct ResourceLoader {
    event_loop_proxy: EventLoopProxy<EditorEvent>,
    asset_root: String,
}

impl ResourceLoader {
    /// Creates a loader resolving resource paths against `asset_root`.
    ///
    /// # Arguments
    /// * `event_loop_proxy` - Used to send finished loads back to the event loop
    /// * `asset_root` - Directory (native) or URL path (web) of the assets
    pub fn new(event_loop_proxy: EventLoopProxy<EditorEvent>, asset_root: impl Into<String>) -> Self {
        Self {
            event_loop_proxy,
            asset_root: asset_root.into(),
        }
    }

    /// Starts loading `key`. The outcome arrives later as a user event.
    pub fn load(&self, key: ResourceKey) {
        let location = locate(&self.asset_root, &key.path);
        let proxy = self.event_loop_proxy.clone();

        let task = async move {
            log::debug!("Loading {} from {}", key, location);
            let result = fetch_bytes(&location)
                .await
                .and_then(|bytes| resources::decode(key.kind, bytes));

            if proxy
                .send_event(EditorEvent::ResourceLoaded { key, result })
                .is_err()
            {
                log::warn!("Event loop closed before {} finished loading", location);
            }
        };

        spawn(task);
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        fn spawn(task: impl Future<Output = ()> + 'static) {
            wasm_bindgen_futures::spawn_local(task);
        }

        /// Builds the URL of a resource relative to the page's origin.
        fn locate(asset_root: &str, path: &str) -> String {
            let origin = web_sys::window()
                .and_then(|window| window.location().origin().ok())
                .unwrap_or_default();
            format!("{}/{}", origin, join_relative(asset_root, path))
        }

        async fn fetch_bytes(url: &str) -> Result<Vec<u8>, ResourceError> {
            let fetch_error = |err: reqwest::Error| ResourceError::Fetch {
                url: url.to_string(),
                message: err.to_string(),
            };

            let response = reqwest::get(url)
                .await
                .and_then(|response| response.error_for_status())
                .map_err(fetch_error)?;
            let bytes = response.bytes().await.map_err(fetch_error)?;
            Ok(bytes.to_vec())
        }

        /// Offers an exported document to the user as a browser download named
        /// after the last segment of `path`.
        pub fn save_text(path: &str, contents: &str) -> Result<(), ResourceError> {
            use wasm_bindgen::{JsCast, JsValue};

            let export_error = |message: String| ResourceError::Export {
                path: path.to_string(),
                message,
            };
            let js_error = |err: JsValue| export_error(format!("{:?}", err));

            let parts = js_sys::Array::of1(&JsValue::from_str(contents));
            let options = web_sys::BlobPropertyBag::new();
            options.set_type("application/json");
            let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options).map_err(js_error)?;
            let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(js_error)?;

            let document = web_sys::window()
                .and_then(|window| window.document())
                .ok_or_else(|| export_error("no document to attach the download to".to_string()))?;
            let anchor = document
                .create_element("a")
                .map_err(js_error)?
                .dyn_into::<web_sys::HtmlAnchorElement>()
                .map_err(|_| export_error("created element is not an anchor".to_string()))?;

            anchor.set_href(&url);
            anchor.set_download(download_name(path));
            anchor.click();
            web_sys::Url::revoke_object_url(&url).map_err(js_error)?;

            log::info!("Offered {} as a download", path);
            Ok(())
        }
    } else {
        fn spawn(task: impl Future<Output = ()> + 'static) {
            pollster::block_on(task);
        }

        /// Builds the file path of a resource relative to the asset directory.
        fn locate(asset_root: &str, path: &str) -> String {
            join_relative(asset_root, path)
        }

        async fn fetch_bytes(path: &str) -> Result<Vec<u8>, ResourceError> {
            std::fs::read(path).map_err(|source| ResourceError::Io {
                path: path.to_string(),
                source,
            })
        }

        /// Writes an exported document to `path`.
        pub fn save_text(path: &str, contents: &str) -> Result<(), ResourceError> {
            std::fs::write(path, contents).map_err(|source| ResourceError::Io {
                path: path.to_string(),
                source,
            })?;
            log::info!("Saved {}", path);
            Ok(())
        }
    }
}

/// File name a download is saved under: the last segment of `path`.
#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
fn download_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn join_relative(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if root.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", root, path)
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use super::*;

    #[test]
    fn paths_are_joined_onto_the_asset_root() {
        assert_eq!(locate("assets/", "/texture/matcap01.png"), "assets/texture/matcap01.png");
        assert_eq!(locate("", "gameData.json"), "gameData.json");
    }

    #[test]
    fn downloads_are_named_after_the_last_path_segment() {
        assert_eq!(download_name("exports/gameData.json"), "gameData.json");
        assert_eq!(download_name("gameData.json"), "gameData.json");
    }

    #[test]
    fn missing_files_report_their_path() {
        let result = pollster::block_on(fetch_bytes("definitely/not/here.png"));

        match result {
            Err(ResourceError::Io { path, .. }) => assert_eq!(path, "definitely/not/here.png"),
            other => panic!("expected an I/O error, got {:?}", other.map(|bytes| bytes.len())),
        }
    }

    #[test]
    fn saved_text_reads_back() {
        let path = std::env::temp_dir().join(format!("kub_editor_save_{}.json", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        save_text(&path, "[]").unwrap();
        let bytes = pollster::block_on(fetch_bytes(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(bytes, b"[]");
    }
}
