//! Manifest parsing for dependency-based framework evidence.
//!
//! Only manifests at the scan root are considered. Parsers are lenient:
//! a malformed manifest contributes nothing instead of failing the scan.

use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::DependencyInfo;

lazy_static! {
    static ref REQUIREMENT_RE: Regex =
        Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:[=<>!~]=?\s*([^\s;#,]+))?").unwrap();
    static ref PYPROJECT_DEP_RE: Regex =
        Regex::new(r#""([A-Za-z0-9][A-Za-z0-9._-]*)\s*([^"]*)""#).unwrap();
    static ref POETRY_DEP_RE: Regex =
        Regex::new(r#"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*=\s*"([^"]+)""#).unwrap();
    static ref GO_REQUIRE_RE: Regex =
        Regex::new(r"^\s*([A-Za-z0-9][^\s]*(?:/[^\s]+)+)\s+(v[^\s]+)").unwrap();
    static ref CARGO_DEP_RE: Regex =
        Regex::new(r#"^\s*([A-Za-z0-9_-]+)\s*=\s*(?:"([^"]+)"|\{)"#).unwrap();
    static ref MAVEN_DEP_RE: Regex = Regex::new(
        r"(?s)<dependency>.*?<groupId>([^<]+)</groupId>.*?<artifactId>([^<]+)</artifactId>(?:.*?<version>([^<]+)</version>)?.*?</dependency>"
    )
    .unwrap();
    static ref GRADLE_DEP_RE: Regex = Regex::new(
        r#"(?:implementation|api|compile|testImplementation|runtimeOnly)\s*[\(]?\s*['"]([A-Za-z0-9._-]+):([A-Za-z0-9._-]+)(?::([^'"]+))?['"]"#
    )
    .unwrap();
}

/// Collect declared dependencies from every recognized manifest at the
/// root, deduplicated by name (first declaration wins).
pub fn collect_dependencies(root: &Path) -> Vec<DependencyInfo> {
    let mut deps: BTreeMap<String, Option<String>> = BTreeMap::new();

    let readers: &[(&str, fn(&str, &mut BTreeMap<String, Option<String>>))] = &[
        ("package.json", parse_package_json),
        ("requirements.txt", parse_requirements),
        ("pyproject.toml", parse_pyproject),
        ("go.mod", parse_go_mod),
        ("Cargo.toml", parse_cargo_toml),
        ("pom.xml", parse_pom_xml),
        ("build.gradle", parse_gradle),
        ("build.gradle.kts", parse_gradle),
    ];

    for (name, parse) in readers {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => parse(&content, &mut deps),
            Err(e) => tracing::warn!(manifest = *name, "cannot read manifest: {}", e),
        }
    }

    deps.into_iter()
        .map(|(name, version)| DependencyInfo { name, version })
        .collect()
}

fn insert(deps: &mut BTreeMap<String, Option<String>>, name: String, version: Option<String>) {
    deps.entry(name).or_insert(version);
}

fn parse_package_json(content: &str, deps: &mut BTreeMap<String, Option<String>>) {
    let parsed: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("malformed package.json: {}", e);
            return;
        }
    };
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = parsed.get(section).and_then(|v| v.as_object()) {
            for (name, version) in map {
                insert(
                    deps,
                    name.clone(),
                    version.as_str().map(|v| v.trim_start_matches(['^', '~']).to_string()),
                );
            }
        }
    }
}

fn parse_requirements(content: &str, deps: &mut BTreeMap<String, Option<String>>) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if let Some(caps) = REQUIREMENT_RE.captures(line) {
            insert(
                deps,
                caps[1].to_lowercase(),
                caps.get(2).map(|v| v.as_str().to_string()),
            );
        }
    }
}

fn parse_pyproject(content: &str, deps: &mut BTreeMap<String, Option<String>>) {
    let mut in_dep_array = false;
    let mut in_poetry_table = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_poetry_table = trimmed == "[tool.poetry.dependencies]";
            in_dep_array = false;
            continue;
        }
        if trimmed.starts_with("dependencies") && trimmed.contains('[') {
            in_dep_array = true;
        }
        if in_dep_array {
            for caps in PYPROJECT_DEP_RE.captures_iter(trimmed) {
                let version = caps[2].trim();
                insert(
                    deps,
                    caps[1].to_lowercase(),
                    (!version.is_empty()).then(|| version.to_string()),
                );
            }
            if trimmed.contains(']') {
                in_dep_array = false;
            }
        } else if in_poetry_table {
            if let Some(caps) = POETRY_DEP_RE.captures(trimmed) {
                if &caps[1] != "python" {
                    insert(deps, caps[1].to_lowercase(), Some(caps[2].to_string()));
                }
            }
        }
    }
}

fn parse_go_mod(content: &str, deps: &mut BTreeMap<String, Option<String>>) {
    for line in content.lines() {
        let line = line.trim().trim_start_matches("require").trim();
        if let Some(caps) = GO_REQUIRE_RE.captures(line) {
            insert(deps, caps[1].to_string(), Some(caps[2].to_string()));
        }
    }
}

fn parse_cargo_toml(content: &str, deps: &mut BTreeMap<String, Option<String>>) {
    let mut in_deps = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_deps = matches!(
                trimmed,
                "[dependencies]" | "[dev-dependencies]" | "[build-dependencies]"
            );
            continue;
        }
        if !in_deps {
            continue;
        }
        if let Some(caps) = CARGO_DEP_RE.captures(trimmed) {
            insert(
                deps,
                caps[1].to_string(),
                caps.get(2).map(|v| v.as_str().to_string()),
            );
        }
    }
}

fn parse_pom_xml(content: &str, deps: &mut BTreeMap<String, Option<String>>) {
    for caps in MAVEN_DEP_RE.captures_iter(content) {
        let name = format!("{}:{}", caps[1].trim(), caps[2].trim());
        insert(deps, name, caps.get(3).map(|v| v.as_str().trim().to_string()));
    }
}

fn parse_gradle(content: &str, deps: &mut BTreeMap<String, Option<String>>) {
    for caps in GRADLE_DEP_RE.captures_iter(content) {
        let name = format!("{}:{}", &caps[1], &caps[2]);
        insert(deps, name, caps.get(3).map(|v| v.as_str().to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(deps: &[DependencyInfo]) -> Vec<&str> {
        deps.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_package_json() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies": {"react": "^18.2.0", "next": "14.0.0"}, "devDependencies": {"jest": "~29.0.0"}}"#,
        )
        .unwrap();

        let deps = collect_dependencies(temp.path());
        assert_eq!(names(&deps), vec!["jest", "next", "react"]);
        let react = deps.iter().find(|d| d.name == "react").unwrap();
        assert_eq!(react.version.as_deref(), Some("18.2.0"));
    }

    #[test]
    fn test_requirements_txt() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(
            temp.path().join("requirements.txt"),
            "# comment\nDjango==4.2\nrequests>=2.0\nflask\n-r other.txt\n",
        )
        .unwrap();

        let deps = collect_dependencies(temp.path());
        assert_eq!(names(&deps), vec!["django", "flask", "requests"]);
        let django = deps.iter().find(|d| d.name == "django").unwrap();
        assert_eq!(django.version.as_deref(), Some("4.2"));
        assert!(deps.iter().find(|d| d.name == "flask").unwrap().version.is_none());
    }

    #[test]
    fn test_go_mod() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(
            temp.path().join("go.mod"),
            "module example.com/app\n\ngo 1.21\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\tgoogle.golang.org/grpc v1.60.0\n)\n",
        )
        .unwrap();

        let deps = collect_dependencies(temp.path());
        assert_eq!(
            names(&deps),
            vec!["github.com/gin-gonic/gin", "google.golang.org/grpc"]
        );
    }

    #[test]
    fn test_cargo_toml() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(
            temp.path().join("Cargo.toml"),
            "[package]\nname = \"app\"\n\n[dependencies]\ntokio = { version = \"1\", features = [\"full\"] }\nserde = \"1.0\"\n",
        )
        .unwrap();

        let deps = collect_dependencies(temp.path());
        assert_eq!(names(&deps), vec!["serde", "tokio"]);
        // package name itself is not a dependency
        assert!(!names(&deps).contains(&"name"));
    }

    #[test]
    fn test_pom_xml() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(
            temp.path().join("pom.xml"),
            "<project><dependencies><dependency><groupId>org.springframework.boot</groupId><artifactId>spring-boot-starter</artifactId><version>3.2.0</version></dependency></dependencies></project>",
        )
        .unwrap();

        let deps = collect_dependencies(temp.path());
        assert_eq!(
            names(&deps),
            vec!["org.springframework.boot:spring-boot-starter"]
        );
        assert_eq!(deps[0].version.as_deref(), Some("3.2.0"));
    }

    #[test]
    fn test_gradle() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(
            temp.path().join("build.gradle"),
            "dependencies {\n    implementation 'org.hibernate:hibernate-core:6.4.0'\n    testImplementation(\"org.junit.jupiter:junit-jupiter\")\n}\n",
        )
        .unwrap();

        let deps = collect_dependencies(temp.path());
        assert_eq!(
            names(&deps),
            vec!["org.hibernate:hibernate-core", "org.junit.jupiter:junit-jupiter"]
        );
    }

    #[test]
    fn test_malformed_manifest_is_ignored() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{not json").unwrap();
        assert!(collect_dependencies(temp.path()).is_empty());
    }

    #[test]
    fn test_no_manifests() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(collect_dependencies(temp.path()).is_empty());
    }
}
