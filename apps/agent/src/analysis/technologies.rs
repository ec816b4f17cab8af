//! Deterministic technology detection from manifests and file extensions.
//!
//! Runs without the model so a manifest-proven technology can never be lost
//! by a sloppy completion. Unparseable manifests contribute nothing.

use serde_json::Value;

use crate::analysis::evidence::{Evidence, EvidenceKind};
use crate::text::normalize_key;

/// npm package name → technology. Matches the whole name, the name inside a
/// scope (`@types/react`) or the scope itself (`@angular`).
const NPM_TECHNOLOGIES: &[(&str, &str)] = &[
    ("react-native", "React Native"),
    ("react", "React"),
    ("react-dom", "React"),
    ("next", "Next.js"),
    ("vue", "Vue.js"),
    ("@angular", "Angular"),
    ("svelte", "Svelte"),
    ("@sveltejs", "Svelte"),
    ("express", "Express.js"),
    ("vite", "Vite"),
    ("webpack", "Webpack"),
    ("jest", "Jest"),
    ("cypress", "Cypress"),
    ("tailwindcss", "Tailwind CSS"),
    ("bootstrap", "Bootstrap"),
    ("typescript", "TypeScript"),
    ("three", "Three.js"),
    ("framer-motion", "Framer Motion"),
    ("axios", "Axios"),
    ("electron", "Electron"),
    ("prisma", "Prisma"),
    ("@prisma", "Prisma"),
    ("mongoose", "MongoDB"),
    ("socket.io", "Socket.IO"),
    ("socket.io-client", "Socket.IO"),
];

/// Python distribution name → technology (exact, lowercase).
const PYTHON_TECHNOLOGIES: &[(&str, &str)] = &[
    ("flask", "Flask"),
    ("django", "Django"),
    ("fastapi", "FastAPI"),
    ("streamlit", "Streamlit"),
    ("pandas", "Pandas"),
    ("numpy", "NumPy"),
    ("scikit-learn", "Scikit-learn"),
    ("torch", "PyTorch"),
    ("tensorflow", "TensorFlow"),
    ("transformers", "Hugging Face"),
    ("opencv-python", "OpenCV"),
    ("matplotlib", "Matplotlib"),
    ("sqlalchemy", "SQLAlchemy"),
    ("celery", "Celery"),
    ("redis", "Redis"),
    ("psycopg2", "PostgreSQL"),
    ("pymongo", "MongoDB"),
    ("pytest", "Pytest"),
    ("ollama", "Ollama"),
    ("langchain", "LangChain"),
    ("requests", "Requests"),
    ("beautifulsoup4", "BeautifulSoup"),
    ("selenium", "Selenium"),
    ("gradio", "Gradio"),
];

/// Cargo crate name → technology (exact).
const CRATE_TECHNOLOGIES: &[(&str, &str)] = &[
    ("tokio", "Tokio"),
    ("axum", "Axum"),
    ("actix-web", "Actix Web"),
    ("serde", "Serde"),
    ("clap", "Clap"),
    ("reqwest", "Reqwest"),
    ("sqlx", "SQLx"),
    ("diesel", "Diesel"),
    ("tauri", "Tauri"),
    ("bevy", "Bevy"),
    ("ratatui", "Ratatui"),
    ("wasm-bindgen", "WebAssembly"),
];

const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("rs", "Rust"),
    ("go", "Go"),
    ("java", "Java"),
    ("c", "C"),
    ("cpp", "C++"),
];

/// Technologies provable from the evidence, in priority order, deduplicated.
pub fn detect_technologies(evidence: &Evidence) -> Vec<String> {
    let mut found = Vec::new();

    for file in evidence.of_kind(EvidenceKind::Manifest) {
        let detected = match file.path.as_str() {
            "package.json" => from_package_json(file.parse_text()),
            "requirements.txt" => from_requirements(file.parse_text()),
            "pyproject.toml" => from_pyproject(file.parse_text()),
            "Cargo.toml" => from_cargo_toml(file.parse_text()),
            "setup.py" => vec!["Python".to_string()],
            "go.mod" => vec!["Go".to_string()],
            "pom.xml" => vec!["Java".to_string(), "Maven".to_string()],
            _ => Vec::new(),
        };
        extend_unique(&mut found, detected);
    }

    for file in evidence.of_kind(EvidenceKind::Source) {
        let ext = file.path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        if let Some((_, language)) = EXTENSION_LANGUAGES.iter().find(|(e, _)| *e == ext) {
            extend_unique(&mut found, [language.to_string()]);
        }
    }

    found
}

/// Project name declared by a manifest, if any.
pub fn manifest_name(evidence: &Evidence) -> Option<String> {
    let name = if let Some(file) = evidence.file("package.json") {
        serde_json::from_str::<Value>(file.parse_text())
            .ok()
            .and_then(|v| v.get("name").and_then(Value::as_str).map(str::to_string))
    } else if let Some(file) = evidence.file("Cargo.toml") {
        parse_toml(file.parse_text()).and_then(|t| toml_str(&t, &["package", "name"]))
    } else if let Some(file) = evidence.file("pyproject.toml") {
        parse_toml(file.parse_text()).and_then(|t| {
            toml_str(&t, &["project", "name"])
                .or_else(|| toml_str(&t, &["tool", "poetry", "name"]))
        })
    } else {
        None
    };

    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Appends items not already present (compared by normalized key).
pub fn extend_unique(list: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        let item = item.trim().to_string();
        if item.is_empty() {
            continue;
        }
        let key = normalize_key(&item);
        if !list.iter().any(|existing| normalize_key(existing) == key) {
            list.push(item);
        }
    }
}

fn from_package_json(content: &str) -> Vec<String> {
    let Ok(manifest) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for section in ["dependencies", "devDependencies", "peerDependencies"] {
        let Some(deps) = manifest.get(section).and_then(Value::as_object) else {
            continue;
        };
        for dep in deps.keys() {
            extend_unique(&mut found, npm_technology(dep));
        }
    }
    found
}

fn npm_technology(dep: &str) -> Option<String> {
    let dep = dep.to_lowercase();
    let (scope, name) = match dep.split_once('/') {
        Some((scope, name)) if scope.starts_with('@') => (Some(scope), name),
        _ => (None, dep.as_str()),
    };

    NPM_TECHNOLOGIES
        .iter()
        .find(|(pattern, _)| *pattern == name || Some(*pattern) == scope)
        .map(|(_, tech)| tech.to_string())
}

fn from_requirements(content: &str) -> Vec<String> {
    let mut found = vec!["Python".to_string()];
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        extend_unique(&mut found, python_technology(line));
    }
    found
}

fn from_pyproject(content: &str) -> Vec<String> {
    let mut found = vec!["Python".to_string()];
    let Some(doc) = parse_toml(content) else {
        return found;
    };

    if let Some(deps) = doc
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        for dep in deps.iter().filter_map(|d| d.as_str()) {
            extend_unique(&mut found, python_technology(dep));
        }
    }

    if let Some(deps) = doc
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        for dep in deps.keys() {
            extend_unique(&mut found, python_technology(dep));
        }
    }
    found
}

fn from_cargo_toml(content: &str) -> Vec<String> {
    let mut found = vec!["Rust".to_string()];
    let Some(doc) = parse_toml(content) else {
        return found;
    };

    for section in ["dependencies", "dev-dependencies"] {
        let Some(deps) = doc.get(section).and_then(|d| d.as_table()) else {
            continue;
        };
        for dep in deps.keys() {
            if let Some((_, tech)) = CRATE_TECHNOLOGIES
                .iter()
                .find(|(name, _)| *name == dep.as_str())
            {
                extend_unique(&mut found, [tech.to_string()]);
            }
        }
    }
    found
}

/// Maps a requirement specifier (`Flask>=2.0; python_version>"3.8"`) to a
/// technology.
fn python_technology(requirement: &str) -> Option<String> {
    let name: String = requirement
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>()
        .to_lowercase()
        .replace('_', "-");

    PYTHON_TECHNOLOGIES
        .iter()
        .find(|(dist, _)| *dist == name)
        .map(|(_, tech)| tech.to_string())
}

fn parse_toml(content: &str) -> Option<toml::Table> {
    content.parse::<toml::Table>().ok()
}

fn toml_str(table: &toml::Table, path: &[&str]) -> Option<String> {
    let (last, parents) = path.split_last()?;
    let mut current = table;
    for key in parents {
        current = current.get(*key)?.as_table()?;
    }
    current.get(*last)?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::evidence::EvidenceFile;
    use std::path::PathBuf;

    fn evidence(files: &[(&str, EvidenceKind, &str)]) -> Evidence {
        Evidence {
            root: PathBuf::from("/tmp/demo-project"),
            files: files
                .iter()
                .map(|(path, kind, content)| EvidenceFile {
                    path: path.to_string(),
                    kind: *kind,
                    content: content.to_string(),
                    full_text: None,
                    bytes: content.len() as u64,
                    truncated: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_package_json_react() {
        let ev = evidence(&[(
            "package.json",
            EvidenceKind::Manifest,
            r#"{"name":"demo","dependencies":{"react":"^18.0.0"}}"#,
        )]);
        assert_eq!(detect_technologies(&ev), vec!["React"]);
        assert_eq!(manifest_name(&ev).as_deref(), Some("demo"));
    }

    #[test]
    fn test_react_dom_does_not_duplicate_react() {
        let ev = evidence(&[(
            "package.json",
            EvidenceKind::Manifest,
            r#"{"dependencies":{"react":"18","react-dom":"18"},"devDependencies":{"typescript":"5"}}"#,
        )]);
        assert_eq!(detect_technologies(&ev), vec!["React", "TypeScript"]);
    }

    #[test]
    fn test_npm_names_match_exactly() {
        let ev = evidence(&[(
            "package.json",
            EvidenceKind::Manifest,
            r#"{"dependencies":{"preact":"10","nextra":"2","@angular/core":"17"},"devDependencies":{"vitest":"1","@types/react":"18"}}"#,
        )]);
        assert_eq!(detect_technologies(&ev), vec!["Angular", "React"]);
    }

    #[test]
    fn test_large_package_json_is_parsed_whole() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = format!(
            r#"{{"name":"big-app","description":"{}","dependencies":{{"react":"^18.0.0"}}}}"#,
            "x".repeat(7000)
        );
        std::fs::write(tmp.path().join("package.json"), manifest).unwrap();

        let ev = crate::analysis::evidence::collect_evidence(tmp.path()).unwrap();
        assert!(ev.file("package.json").unwrap().truncated);
        assert_eq!(detect_technologies(&ev), vec!["React"]);
        assert_eq!(manifest_name(&ev).as_deref(), Some("big-app"));
    }

    #[test]
    fn test_requirements_with_specifiers() {
        let ev = evidence(&[(
            "requirements.txt",
            EvidenceKind::Manifest,
            "# web\nFlask>=2.0\nscikit_learn==1.3\n-r other.txt\nunknown-lib\n",
        )]);
        assert_eq!(
            detect_technologies(&ev),
            vec!["Python", "Flask", "Scikit-learn"]
        );
    }

    #[test]
    fn test_cargo_manifest_name_and_crates() {
        let ev = evidence(&[(
            "Cargo.toml",
            EvidenceKind::Manifest,
            "[package]\nname = \"rack\"\n\n[dependencies]\ntokio = \"1\"\nclap = { version = \"4\" }\n",
        )]);
        assert_eq!(detect_technologies(&ev), vec!["Rust", "Clap", "Tokio"]);
        assert_eq!(manifest_name(&ev).as_deref(), Some("rack"));
    }

    #[test]
    fn test_pyproject_poetry_name() {
        let ev = evidence(&[(
            "pyproject.toml",
            EvidenceKind::Manifest,
            "[tool.poetry]\nname = \"scanner\"\n[tool.poetry.dependencies]\nfastapi = \"^0.100\"\n",
        )]);
        assert_eq!(manifest_name(&ev).as_deref(), Some("scanner"));
        assert_eq!(detect_technologies(&ev), vec!["Python", "FastAPI"]);
    }

    #[test]
    fn test_source_extensions_add_languages_after_manifests() {
        let ev = evidence(&[
            ("go.mod", EvidenceKind::Manifest, "module x"),
            ("main.go", EvidenceKind::Source, "package main"),
            ("tools/gen.py", EvidenceKind::Source, "print(1)"),
        ]);
        assert_eq!(detect_technologies(&ev), vec!["Go", "Python"]);
    }

    #[test]
    fn test_invalid_package_json_contributes_nothing() {
        let ev = evidence(&[("package.json", EvidenceKind::Manifest, "{ not json")]);
        assert!(detect_technologies(&ev).is_empty());
        assert_eq!(manifest_name(&ev), None);
    }
}
