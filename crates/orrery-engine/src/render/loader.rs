use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use orrery_asset::ModelData;

use super::entity::{ModelVariant, Transform};
use super::error::RenderError;

/// A model to load from disk and place in the scene.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub path: PathBuf,
    pub variant: ModelVariant,
    pub transform: Transform,
}

/// A decoded model ready for upload on the frame thread.
#[derive(Debug)]
pub struct LoadedModel {
    pub request: ModelRequest,
    pub data: ModelData,
}

type LoadResult = (ModelRequest, Result<ModelData, RenderError>);

/// Reads, parses and decodes model files off the frame thread.
///
/// Each request runs on its own thread and reports back over a channel;
/// [`ModelLoader::drain`] collects whatever has finished without blocking.
pub struct ModelLoader {
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    pending: usize,
}

impl Default for ModelLoader {
    fn default() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx, pending: 0 }
    }
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts loading `request`. Fails only if the loader thread can't be spawned.
    pub fn request(&mut self, request: ModelRequest) -> Result<(), RenderError> {
        let tx = self.tx.clone();
        let path = request.path.clone();

        thread::Builder::new()
            .name("orrery-loader".into())
            .spawn(move || {
                let result = load_file(&request.path);
                // The receiver only disappears with the loader itself.
                let _ = tx.send((request, result));
            })
            .map_err(|source| RenderError::Io { path: path.clone(), source })?;

        self.pending += 1;
        log::debug!("loading model {}", path.display());
        Ok(())
    }

    /// Requests still in flight.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Completed loads, in completion order. Failures are logged and dropped.
    pub fn drain(&mut self) -> Vec<LoadedModel> {
        let mut loaded = Vec::new();
        for (request, result) in self.rx.try_iter() {
            self.pending -= 1;
            if let Some(model) = accept(request, result) {
                loaded.push(model);
            }
        }
        loaded
    }

    /// Blocks until every pending request has reported or `timeout` passes.
    #[cfg(test)]
    fn wait_all(&mut self, timeout: std::time::Duration) -> Vec<LoadedModel> {
        let deadline = std::time::Instant::now() + timeout;
        let mut loaded = Vec::new();
        while self.pending > 0 {
            let Ok((request, result)) = self.rx.recv_deadline(deadline) else {
                break;
            };
            self.pending -= 1;
            loaded.extend(accept(request, result));
        }
        loaded
    }
}

fn accept(request: ModelRequest, result: Result<ModelData, RenderError>) -> Option<LoadedModel> {
    match result {
        Ok(data) => {
            log::debug!(
                "loaded {}: {} indices, {} vertices, diffuse {}",
                request.path.display(),
                data.index_count(),
                data.vertex_count(),
                if data.diffuse.is_some() { "embedded" } else { "placeholder" }
            );
            Some(LoadedModel { request, data })
        }
        Err(err) => {
            log::warn!("skipping model {}: {err}", request.path.display());
            None
        }
    }
}

/// Reads and fully decodes one container file.
pub fn load_file(path: &Path) -> Result<ModelData, RenderError> {
    let bytes = std::fs::read(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(orrery_asset::parse(&bytes)?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use orrery_asset::{ContainerWriter, FormatError, Vertex};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("orrery-loader-{}-{name}", std::process::id()))
    }

    fn request(path: PathBuf) -> ModelRequest {
        ModelRequest {
            path,
            variant: ModelVariant::General,
            transform: Transform::default(),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_file(&temp_path("does-not-exist.bin")).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let path = temp_path("bad.bin");
        std::fs::write(&path, [9, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            err,
            RenderError::Format(FormatError::UnknownSection { .. })
        ));
    }

    #[test]
    fn good_and_bad_requests() {
        let good = temp_path("tri.bin");
        std::fs::write(
            &good,
            ContainerWriter::new()
                .indices(&[0, 1, 2])
                .vertices(&[Vertex::default(); 3])
                .finish(),
        )
        .unwrap();

        let mut loader = ModelLoader::new();
        loader.request(request(good.clone())).unwrap();
        loader.request(request(temp_path("absent.bin"))).unwrap();
        assert_eq!(loader.pending(), 2);

        let loaded = loader.wait_all(Duration::from_secs(10));
        std::fs::remove_file(&good).unwrap();

        assert_eq!(loader.pending(), 0);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].request.path, good);
        assert_eq!(loaded[0].data.indices, Some(vec![0, 1, 2]));
        assert!(loader.drain().is_empty());
    }
}
