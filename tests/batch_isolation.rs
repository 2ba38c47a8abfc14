use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use note_reel::{
    batch::{BatchRunner, SharedInputs},
    config::Config,
    error::ReelError,
    video::{Clip, ClipWriter, EncodedVideo, Frame},
    Result,
};
use tempfile::tempdir;

/// Writes a marker file instead of encoding
#[derive(Default)]
struct MarkerWriter {
    durations: Mutex<Vec<(PathBuf, f64)>>,
}

impl ClipWriter for MarkerWriter {
    fn write(&self, clip: &Clip, path: &Path) -> Result<EncodedVideo> {
        std::fs::write(path, b"marker")?;
        self.durations.lock().unwrap().push((path.to_path_buf(), clip.duration()));
        Ok(EncodedVideo {
            path: path.to_path_buf(),
            duration: clip.duration(),
            frame_count: 0,
            file_size: 6,
        })
    }
}

fn shared_inputs() -> SharedInputs {
    SharedInputs {
        intro: Clip::still(Frame::new_filled(1920, 1080, [255, 255, 255]), 2.0),
        outro: Clip::still(Frame::new_filled(1920, 1080, [255, 255, 255]), 1.0),
        background: Clip::still(Frame::new_filled(1920, 1080, [0, 0, 64]), 1.0),
    }
}

#[tokio::test]
async fn failing_folder_does_not_stop_the_batch() {
    let notes = tempdir().unwrap();
    let out = tempdir().unwrap();

    // Sorted first, so the failure happens before the good folder runs.
    let broken = notes.path().join("a-broken");
    std::fs::create_dir(&broken).unwrap();
    std::fs::write(broken.join("lecture.mp4"), b"this is not a video").unwrap();

    let empty = notes.path().join("b-empty");
    std::fs::create_dir(&empty).unwrap();
    std::fs::write(empty.join("todo.txt"), b"later").unwrap();

    let good = notes.path().join("c-good");
    std::fs::create_dir(&good).unwrap();
    RgbImage::from_pixel(640, 480, Rgb([200, 100, 0])).save(good.join("slide.jpg")).unwrap();

    let mut config = Config::default();
    config.output.directory = out.path().to_path_buf();
    let writer = Arc::new(MarkerWriter::default());
    let runner = BatchRunner::with_writer(&config, writer.clone()).unwrap();

    let report = runner.run_folders(notes.path(), &shared_inputs()).await.unwrap();

    assert_eq!(report.folders_seen(), 3);
    assert_eq!(report.written.len(), 1);
    assert_eq!(report.skipped, vec![empty]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].folder, broken);
    assert!(matches!(report.failed[0].error, ReelError::Decode(_)));
    assert!(report.has_failures());

    assert!(out.path().join("c-good.mp4").exists());
    assert!(!out.path().join("a-broken.mp4").exists());
    assert!(!out.path().join("b-empty.mp4").exists());

    // intro 2 + image 4 + outro 1
    let durations = writer.durations.lock().unwrap();
    assert_eq!(durations.len(), 1);
    assert!((durations[0].1 - 7.0).abs() < 1e-9);
}

#[tokio::test]
async fn image_duration_comes_from_config() {
    let notes = tempdir().unwrap();
    let out = tempdir().unwrap();
    let folder = notes.path().join("deck");
    std::fs::create_dir(&folder).unwrap();
    for name in ["1.png", "2.png", "3.PNG"] {
        RgbImage::from_pixel(100, 100, Rgb([1, 1, 1])).save(folder.join(name)).unwrap();
    }

    let mut config = Config::default();
    config.assembly.image_duration = 2;
    config.output.directory = out.path().join("nested/output");
    let writer = Arc::new(MarkerWriter::default());
    let runner = BatchRunner::with_writer(&config, writer.clone()).unwrap();

    let report = runner.run_folders(notes.path(), &shared_inputs()).await.unwrap();

    assert!(!report.has_failures());
    assert!(out.path().join("nested/output/deck.mp4").exists());
    let durations = writer.durations.lock().unwrap();
    assert!((durations[0].1 - (2.0 + 3.0 * 2.0 + 1.0)).abs() < 1e-9);
}

#[tokio::test]
async fn missing_input_aborts_before_any_folder() {
    let notes = tempdir().unwrap();
    let folder = notes.path().join("deck");
    std::fs::create_dir(&folder).unwrap();

    let out = tempdir().unwrap();
    let mut config = Config::default();
    config.output.directory = out.path().to_path_buf();
    let writer = Arc::new(MarkerWriter::default());
    let runner = BatchRunner::with_writer(&config, writer.clone()).unwrap();

    let result = runner
        .run(&note_reel::BatchInputs {
            intro: None,
            outro: None,
            background: None,
            parent: Some(notes.path().to_path_buf()),
        })
        .await;

    assert!(matches!(result, Err(ReelError::Input(_))));
    assert!(writer.durations.lock().unwrap().is_empty());
}
