//! Integration tests for the conversion pipeline.
//!
//! Documents and the speech engine are in-memory stand-ins plugged in through
//! `DocumentLoader` / `SpeechBackend`, so these run without pdfium, espeak-ng
//! or ffmpeg installed.

use async_trait::async_trait;
use pdf2audio::{
    convert, convert_sync, inspect_with, ConversionConfig, ConversionProgressCallback,
    DocumentLoader, NarratorGender, PageError, PageSource, PageStatus, Pdf2AudioError,
    SpeechBackend, Voice, MAX_PAGE,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Pages held in memory; `None` fails extraction.
struct MemoryBook {
    pages: Vec<Option<String>>,
}

impl PageSource for MemoryBook {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PageError> {
        self.pages[index]
            .clone()
            .ok_or_else(|| PageError::ExtractionFailed {
                page: index,
                detail: "broken content stream".into(),
            })
    }

    fn title(&self) -> Option<String> {
        Some("Dune".into())
    }
}

struct MemoryLoader {
    book: MemoryBook,
    open_error: Option<fn(&Path) -> Pdf2AudioError>,
    opened: AtomicUsize,
}

impl MemoryLoader {
    fn new(pages: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            book: MemoryBook {
                pages: pages.iter().map(|p| p.map(str::to_string)).collect(),
            },
            open_error: None,
            opened: AtomicUsize::new(0),
        })
    }

    fn failing(error: fn(&Path) -> Pdf2AudioError) -> Arc<Self> {
        Arc::new(Self {
            book: MemoryBook { pages: vec![] },
            open_error: Some(error),
            opened: AtomicUsize::new(0),
        })
    }
}

impl DocumentLoader for MemoryLoader {
    fn with_document(
        &self,
        path: &Path,
        _password: Option<&str>,
        visit: &mut dyn FnMut(&dyn PageSource),
    ) -> Result<(), Pdf2AudioError> {
        if let Some(error) = self.open_error {
            return Err(error(path));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        visit(&self.book);
        Ok(())
    }
}

/// Writes `"<voice id>|<text>"` instead of audio and remembers what it said.
#[derive(Default)]
struct TranscriptBackend {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechBackend for TranscriptBackend {
    fn name(&self) -> &str {
        "transcript"
    }

    async fn voices(&self) -> Result<Vec<Voice>, Pdf2AudioError> {
        Ok(vec![Voice::new("male-1", "Male"), Voice::new("female-1", "Female")])
    }

    async fn render(&self, text: &str, voice: &Voice, output: &Path) -> Result<(), Pdf2AudioError> {
        self.spoken.lock().unwrap().push(text.to_string());
        tokio::fs::write(output, format!("{}|{}", voice.id, text))
            .await
            .map_err(|e| Pdf2AudioError::SynthesisFailed {
                detail: e.to_string(),
            })
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl ConversionProgressCallback for EventLog {
    fn on_conversion_start(&self, total_pages: usize) {
        self.0.lock().unwrap().push(format!("start {total_pages}"));
    }
    fn on_page_complete(&self, page: usize, _total: usize, _chars: usize) {
        self.0.lock().unwrap().push(format!("ok {page}"));
    }
    fn on_page_skipped(&self, page: usize, _total: usize, _reason: &str) {
        self.0.lock().unwrap().push(format!("skip {page}"));
    }
    fn on_synthesis_start(&self, _chars: usize) {
        self.0.lock().unwrap().push("synth".into());
    }
    fn on_conversion_complete(&self, total_pages: usize, narrated_pages: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done {narrated_pages}/{total_pages}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Workspace {
    dir: TempDir,
    pdf: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("book.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n% in-memory fixture\n%%EOF\n").unwrap();
        Self { dir, pdf }
    }

    fn out_dir(&self) -> PathBuf {
        self.dir.path().join("outputs")
    }

    fn config(
        &self,
        loader: Arc<dyn DocumentLoader>,
        backend: Arc<dyn SpeechBackend>,
        gender: NarratorGender,
        first: usize,
        last: usize,
    ) -> ConversionConfig {
        ConversionConfig::builder()
            .book_title("Dune")
            .author("Frank Herbert")
            .narrator_gender(gender)
            .pages(first, last)
            .output_dir(self.out_dir())
            .loader(loader)
            .backend(backend)
            .build()
            .unwrap()
    }
}

fn dune() -> Arc<MemoryLoader> {
    MemoryLoader::new(&[
        Some("Dune 1\nA beginning is the time for taking the most delicate care.\n2 Frank Herbert"),
        Some("Dune 3\nThe Reverend Mother. 4 Frank Herbert"),
        Some("DUNE 5 Fear is the mind-killer.\n6 frank herbert"),
    ])
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn narrates_range_without_running_headers() {
    let ws = Workspace::new();
    let backend = Arc::new(TranscriptBackend::default());
    let config = ws.config(dune(), backend.clone(), NarratorGender::Male, 0, 2);

    let output = convert(&ws.pdf, &config).await.unwrap();

    assert_eq!(output.output_path, ws.out_dir().join("Dune_pgs_0_2_male.mp3"));
    let written = std::fs::read_to_string(&output.output_path).unwrap();
    assert_eq!(
        written,
        "male-1|A beginning is the time for taking the most delicate care. \
         The Reverend Mother. Fear is the mind-killer."
    );

    let spoken = backend.spoken.lock().unwrap();
    assert_eq!(spoken.len(), 1);
    assert!(!spoken[0].to_lowercase().contains("herbert"));
    assert!(!spoken[0].contains("Dune"));

    assert_eq!(output.stats.requested_pages, 3);
    assert_eq!(output.stats.narrated_pages, 3);
    assert_eq!(output.stats.skipped_pages, 0);
    assert_eq!(output.stats.characters, spoken[0].chars().count());
}

#[tokio::test]
async fn subrange_narrates_only_selected_pages() {
    let ws = Workspace::new();
    let config = ws.config(
        dune(),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Female,
        1,
        1,
    );

    let output = convert(&ws.pdf, &config).await.unwrap();
    let written = std::fs::read_to_string(&output.output_path).unwrap();
    assert_eq!(written, "female-1|The Reverend Mother.");
    assert_eq!(output.pages.len(), 1);
    assert_eq!(output.pages[0].page, 1);
}

#[tokio::test]
async fn first_page_past_document_end_is_empty_result() {
    let ws = Workspace::new();
    let backend = Arc::new(TranscriptBackend::default());
    let config = ws.config(
        MemoryLoader::new(&[Some("one"), Some("two")]),
        backend.clone(),
        NarratorGender::Male,
        5,
        7,
    );

    let err = convert(&ws.pdf, &config).await.unwrap_err();
    assert!(
        matches!(err, Pdf2AudioError::EmptyResult { first: 5, last: 7 }),
        "got: {err}"
    );
    assert!(backend.spoken.lock().unwrap().is_empty());
    assert!(!ws.out_dir().join("Dune_pgs_5_7_male.mp3").exists());
}

#[tokio::test]
async fn pages_of_only_headers_are_empty_result() {
    let ws = Workspace::new();
    let config = ws.config(
        MemoryLoader::new(&[Some("Dune 12"), Some("13 Frank Herbert"), Some("   ")]),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Female,
        0,
        2,
    );

    let err = convert(&ws.pdf, &config).await.unwrap_err();
    assert!(matches!(err, Pdf2AudioError::EmptyResult { .. }));
    assert!(!ws.out_dir().exists() || std::fs::read_dir(ws.out_dir()).unwrap().count() == 0);
}

#[tokio::test]
async fn unrecognised_gender_label_narrates_female() {
    let ws = Workspace::new();
    let config = ws.config(
        dune(),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::from_label("robot"),
        0,
        0,
    );

    let output = convert(&ws.pdf, &config).await.unwrap();
    assert!(output
        .output_path
        .to_string_lossy()
        .ends_with("Dune_pgs_0_0_female.mp3"));
    let written = std::fs::read_to_string(&output.output_path).unwrap();
    assert!(written.starts_with("female-1|"));
}

#[tokio::test]
async fn repeated_request_overwrites_output() {
    let ws = Workspace::new();
    let backend: Arc<dyn SpeechBackend> = Arc::new(TranscriptBackend::default());

    let first = ws.config(
        MemoryLoader::new(&[Some("First edition.")]),
        backend.clone(),
        NarratorGender::Male,
        0,
        0,
    );
    let second = ws.config(
        MemoryLoader::new(&[Some("Second edition.")]),
        backend,
        NarratorGender::Male,
        0,
        0,
    );

    let a = convert(&ws.pdf, &first).await.unwrap();
    let b = convert(&ws.pdf, &second).await.unwrap();

    assert_eq!(a.output_path, b.output_path);
    assert_eq!(
        std::fs::read_to_string(&b.output_path).unwrap(),
        "male-1|Second edition."
    );
    assert_eq!(std::fs::read_dir(ws.out_dir()).unwrap().count(), 1);
}

#[tokio::test]
async fn failing_middle_page_is_skipped() {
    let ws = Workspace::new();
    let events = Arc::new(EventLog::default());
    let mut config = ws.config(
        MemoryLoader::new(&[Some("Page zero."), None, Some("Page two.")]),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Female,
        0,
        2,
    );
    config.progress_callback = Some(events.clone());

    let output = convert(&ws.pdf, &config).await.unwrap();

    let written = std::fs::read_to_string(&output.output_path).unwrap();
    assert_eq!(written, "female-1|Page zero. Page two.");
    assert_eq!(output.stats.narrated_pages, 2);
    assert_eq!(output.stats.skipped_pages, 1);
    assert!(matches!(
        output.pages[1].status,
        PageStatus::Skipped {
            error: PageError::ExtractionFailed { page: 1, .. }
        }
    ));

    assert_eq!(
        *events.0.lock().unwrap(),
        vec!["start 3", "ok 0", "skip 1", "ok 2", "synth", "done 2/3"]
    );
}

#[tokio::test]
async fn range_past_max_page_is_rejected_before_loading() {
    let ws = Workspace::new();
    let loader = dune();
    let backend = Arc::new(TranscriptBackend::default());

    assert!(ConversionConfig::builder()
        .book_title("Dune")
        .author("Frank Herbert")
        .pages(0, 2_000_000)
        .build()
        .is_err());

    let config = ConversionConfig {
        last_page: MAX_PAGE + 1,
        ..ws.config(loader.clone(), backend.clone(), NarratorGender::Male, 0, 2)
    };
    let err = convert(&ws.pdf, &config).await.unwrap_err();
    assert!(matches!(err, Pdf2AudioError::InvalidConfig(_)), "got: {err}");
    assert_eq!(loader.opened.load(Ordering::SeqCst), 0);
    assert!(backend.spoken.lock().unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn written_audio_is_readable_by_others() {
    use std::os::unix::fs::PermissionsExt;

    let ws = Workspace::new();
    let config = ws.config(
        dune(),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Female,
        0,
        0,
    );
    let output = convert(&ws.pdf, &config).await.unwrap();
    let mode = std::fs::metadata(&output.output_path)
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o644, "got {:o}", mode & 0o777);
}

#[tokio::test]
async fn very_long_title_still_writes_output() {
    let ws = Workspace::new();
    let backend = Arc::new(TranscriptBackend::default());
    let config = ConversionConfig {
        book_title: "A".repeat(300),
        ..ws.config(dune(), backend, NarratorGender::Female, 0, 0)
    };

    let output = convert(&ws.pdf, &config).await.unwrap();
    assert!(output.output_path.exists());
    let name = output.output_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.len() < 255);
    assert!(name.ends_with("_pgs_0_0_female.mp3"));
}

#[tokio::test]
async fn missing_file_is_reported_before_loading() {
    let ws = Workspace::new();
    let loader = dune();
    let config = ws.config(
        loader.clone(),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Male,
        0,
        1,
    );

    let err = convert(ws.dir.path().join("absent.pdf"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2AudioError::FileNotFound { .. }), "got: {err}");
    assert_eq!(loader.opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_pdf_input_is_rejected() {
    let ws = Workspace::new();
    let notes = ws.dir.path().join("notes.pdf");
    std::fs::write(&notes, b"plain text, not a pdf").unwrap();
    let config = ws.config(
        dune(),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Male,
        0,
        1,
    );

    let err = convert(&notes, &config).await.unwrap_err();
    assert!(matches!(err, Pdf2AudioError::NotAPdf { .. }), "got: {err}");
}

#[tokio::test]
async fn document_level_failure_is_fatal_and_writes_nothing() {
    let ws = Workspace::new();
    let backend = Arc::new(TranscriptBackend::default());
    let config = ws.config(
        MemoryLoader::failing(|path| Pdf2AudioError::WrongPassword {
            path: path.to_path_buf(),
        }),
        backend.clone(),
        NarratorGender::Male,
        0,
        1,
    );

    let err = convert(&ws.pdf, &config).await.unwrap_err();
    assert!(matches!(err, Pdf2AudioError::WrongPassword { .. }), "got: {err}");
    assert!(backend.spoken.lock().unwrap().is_empty());
    assert!(!ws.out_dir().exists());
}

#[test]
fn convert_sync_runs_outside_a_runtime() {
    let ws = Workspace::new();
    let config = ws.config(
        dune(),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Male,
        2,
        2,
    );

    let output = convert_sync(&ws.pdf, &config).unwrap();
    assert_eq!(
        std::fs::read_to_string(&output.output_path).unwrap(),
        "male-1|Fear is the mind-killer."
    );
}

#[tokio::test]
async fn inspect_reports_page_count_and_metadata() {
    let ws = Workspace::new();
    let info = inspect_with(dune(), &ws.pdf, None).await.unwrap();
    assert_eq!(info.page_count, 3);
    assert_eq!(info.title.as_deref(), Some("Dune"));
    assert_eq!(info.author, None);
}

#[test]
fn output_serialises_to_json() {
    let ws = Workspace::new();
    let config = ws.config(
        MemoryLoader::new(&[Some("Text."), Some("   ")]),
        Arc::new(TranscriptBackend::default()),
        NarratorGender::Female,
        0,
        1,
    );
    let output = convert_sync(&ws.pdf, &config).unwrap();

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["pages"][0]["status"]["status"], "narrated");
    assert_eq!(json["pages"][1]["status"]["status"], "skipped");
    assert_eq!(json["pages"][1]["status"]["error"]["kind"], "no_text");
    assert_eq!(json["stats"]["narrated_pages"], 1);
}
