use std::path::Path;

pub const BREADCRUMB_SEPARATOR: &str = " › ";

const AREA_NAMES: &[(&str, &str)] = &[
    ("/payments/", "Payments"),
    ("/orders/", "Orders"),
    ("/wallets/", "Wallets"),
    ("/components/", "Mollie Components"),
    ("/connect/", "Mollie Connect"),
    ("/reference/", "API reference"),
];

/// Maps build output file paths to their public documentation URLs.
#[derive(Debug, Clone)]
pub struct PermalinkResolver {
    build_prefix: String,
    base_url: String,
}

impl PermalinkResolver {
    pub fn new(build_dir: &Path, base_url: &str) -> Self {
        let build_prefix = normalize_path(build_dir)
            .trim_end_matches('/')
            .to_string();
        Self {
            build_prefix,
            base_url: base_url.to_string(),
        }
    }

    pub fn url_for_path(&self, file_path: &Path) -> String {
        self.url_for(&normalize_path(file_path))
    }

    /// `build/html/payments/index.html` keeps its `payments/index` remainder; only a
    /// bare `index` collapses to the site root.
    pub fn url_for(&self, file_path: &str) -> String {
        let relative = file_path
            .strip_prefix(&self.build_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|rest| {
                let rest = rest.strip_prefix("html/").unwrap_or(rest);
                rest.strip_suffix(".html").unwrap_or(rest)
            })
            .unwrap_or(file_path);
        let relative = if relative == "index" { "" } else { relative };
        format!("{}{relative}", self.base_url)
    }
}

pub fn area_name_from_url(url: &str) -> Option<&'static str> {
    AREA_NAMES
        .iter()
        .find(|(fragment, _)| url.contains(fragment))
        .map(|(_, name)| *name)
}

pub fn breadcrumbs(area: Option<&str>, title: &str, section: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(area) = area {
        parts.push(area);
    }
    parts.push(title);
    if let Some(section) = section {
        parts.push(section);
    }
    parts.join(BREADCRUMB_SEPARATOR)
}

pub fn depth(section: Option<&str>, parameter_name: Option<&str>) -> u32 {
    let mut depth = 0;
    if section.is_some() {
        depth += 1;
    }
    if let Some(name) = parameter_name {
        depth += 1 + name.matches('.').count() as u32;
    }
    depth
}

pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
