use anyhow::{Context, Result};
use tracing::info;

use crate::algolia::SearchIndex;
use crate::config::SiteSettings;
use crate::record::{RecordType, SearchRecord};
use crate::walker::SiteWalker;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Keep every uploaded record in the report, for `--output`.
    pub keep_records: bool,
}

#[derive(Debug, Clone)]
pub struct DirectoryUpload {
    pub directory: String,
    pub records: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub directories_scanned: usize,
    pub directories_excluded: usize,
    pub text_records: usize,
    pub parameter_records: usize,
    pub uploads: Vec<DirectoryUpload>,
    pub request_count: usize,
    pub records: Vec<SearchRecord>,
}

impl SyncReport {
    pub fn total_records(&self) -> usize {
        self.text_records + self.parameter_records
    }
}

/// Replace the index contents with the records extracted from the build dir.
///
/// The directory list is read before the index is cleared, so a missing build
/// dir leaves the index untouched. Any later failure aborts the run and may
/// leave the index partly populated.
pub fn sync_site<I: SearchIndex>(
    site: &SiteSettings,
    index: &mut I,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let walker = SiteWalker::new(&site.build_dir, &site.base_url, &site.excluded_fragments);
    let directories = walker.directories()?;
    let mut report = SyncReport::default();

    info!("Clearing the existing index...");
    index.clear().context("failed to clear search index")?;
    info!("Index cleared");

    for directory in &directories {
        info!("Scanning directory '{}'...", directory.label);
        report.directories_scanned += 1;
        if walker.is_excluded(directory) {
            report.directories_excluded += 1;
            continue;
        }

        let records = walker.scan_directory(directory)?;
        if records.is_empty() {
            continue;
        }

        info!(
            "Sending {} records for directory '{}'...",
            records.len(),
            directory.label
        );
        index
            .upload(&records)
            .with_context(|| format!("failed to upload records for {}", directory.label))?;
        info!("Uploaded {} records", records.len());

        for record in &records {
            match record.record_type {
                RecordType::Text => report.text_records += 1,
                RecordType::Parameter => report.parameter_records += 1,
            }
        }
        report.uploads.push(DirectoryUpload {
            directory: directory.label.clone(),
            records: records.len(),
        });
        if options.keep_records {
            report.records.extend(records);
        }
    }

    report.request_count = index.request_count();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use anyhow::bail;
    use tempfile::tempdir;

    use super::{SyncOptions, sync_site};
    use crate::algolia::SearchIndex;
    use crate::config::{DEFAULT_BASE_URL, DEFAULT_EXCLUDED_FRAGMENTS, SiteSettings};
    use crate::record::{RecordType, SearchRecord};

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Clear,
        Upload(Vec<SearchRecord>),
    }

    #[derive(Default)]
    struct MockIndex {
        calls: Vec<Call>,
        fail_upload: bool,
    }

    impl SearchIndex for MockIndex {
        fn clear(&mut self) -> anyhow::Result<()> {
            self.calls.push(Call::Clear);
            Ok(())
        }

        fn upload(&mut self, records: &[SearchRecord]) -> anyhow::Result<()> {
            if self.fail_upload {
                bail!("HTTP 403 Forbidden");
            }
            self.calls.push(Call::Upload(records.to_vec()));
            Ok(())
        }

        fn request_count(&self) -> usize {
            self.calls.len()
        }
    }

    fn site(build_dir: &Path) -> SiteSettings {
        SiteSettings {
            build_dir: build_dir.to_path_buf(),
            base_url: DEFAULT_BASE_URL.to_string(),
            excluded_fragments: DEFAULT_EXCLUDED_FRAGMENTS
                .iter()
                .map(|fragment| fragment.to_string())
                .collect(),
        }
    }

    const HELLO_PAGE: &str = "<!DOCTYPE html>
<html><body><div class=\"content\">
<h1>Hello</h1>
<div class=\"section\">
<p>Hello</p>
<div class=\"parameter\">
<div class=\"parameter__name\"><code>id</code></div>
<div class=\"parameter__description\"><p>The identifier.</p></div>
</div>
</div>
</div></body></html>
";

    #[test]
    fn single_page_directory_uploads_text_and_parameter_record() {
        let temp = tempdir().expect("tempdir");
        let build = temp.path().join("build");
        fs::create_dir_all(build.join("guides")).expect("create");
        fs::write(build.join("guides/hello.html"), HELLO_PAGE).expect("write");

        let mut index = MockIndex::default();
        let report = sync_site(&site(&build), &mut index, &SyncOptions::default()).expect("sync");

        assert_eq!(index.calls.len(), 2);
        assert_eq!(index.calls[0], Call::Clear);
        let Call::Upload(records) = &index.calls[1] else {
            panic!("expected upload after clear");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, RecordType::Text);
        assert_eq!(records[0].content, "Hello");
        assert_eq!(records[0].depth, 0);
        assert_eq!(records[1].record_type, RecordType::Parameter);
        assert_eq!(records[1].title, "Parameter `id`");
        assert_eq!(records[1].content, "The identifier.");
        assert_eq!(records[1].depth, 1);
        assert_eq!(records[1].permalink, "https://docs.mollie.com/guides/hello");

        assert_eq!(report.directories_scanned, 2);
        assert_eq!(report.total_records(), 2);
        assert_eq!(report.uploads.len(), 1);
        assert!(report.uploads[0].directory.ends_with("build/guides"));
        assert!(report.records.is_empty());
    }

    #[test]
    fn excluded_directories_contribute_nothing() {
        let temp = tempdir().expect("tempdir");
        let build = temp.path().join("build");
        for dir in [
            "html/reference/v1",
            "html/reference/v1/payments-api",
            "html/reference/reseller-api",
            "html/reference/v2",
        ] {
            fs::create_dir_all(build.join(dir)).expect("create");
            fs::write(build.join(dir).join("page.html"), HELLO_PAGE).expect("write");
        }

        let mut index = MockIndex::default();
        let report = sync_site(
            &site(&build),
            &mut index,
            &SyncOptions { keep_records: true },
        )
        .expect("sync");

        assert_eq!(report.directories_excluded, 3);
        assert_eq!(report.uploads.len(), 1);
        assert!(
            report
                .records
                .iter()
                .all(|record| record.permalink == "https://docs.mollie.com/reference/v2/page")
        );
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn directories_without_pages_are_not_uploaded() {
        let temp = tempdir().expect("tempdir");
        let build = temp.path().join("build");
        fs::create_dir_all(build.join("_static")).expect("create");
        fs::write(build.join("_static/site.js"), "void 0;").expect("write");

        let mut index = MockIndex::default();
        let report = sync_site(&site(&build), &mut index, &SyncOptions::default()).expect("sync");
        assert_eq!(index.calls, vec![Call::Clear]);
        assert_eq!(report.total_records(), 0);
    }

    #[test]
    fn missing_build_dir_fails_before_clearing() {
        let temp = tempdir().expect("tempdir");
        let mut index = MockIndex::default();
        let error = sync_site(
            &site(&temp.path().join("missing")),
            &mut index,
            &SyncOptions::default(),
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("build directory not found"));
        assert!(index.calls.is_empty());
    }

    #[test]
    fn upload_failure_aborts_after_clear() {
        let temp = tempdir().expect("tempdir");
        let build = temp.path().join("build");
        fs::create_dir_all(&build).expect("create");
        fs::write(build.join("index.html"), HELLO_PAGE).expect("write");

        let mut index = MockIndex {
            fail_upload: true,
            ..MockIndex::default()
        };
        let error =
            sync_site(&site(&build), &mut index, &SyncOptions::default()).expect_err("must fail");
        assert!(format!("{error:#}").contains("HTTP 403"));
        assert_eq!(index.calls, vec![Call::Clear]);
    }
}
