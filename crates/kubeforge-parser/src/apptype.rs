//! Application category inference from base-image names.
//!
//! An ordered rule table is evaluated top-to-bottom against the image
//! reference; the first substring match wins and `Generic` is the explicit
//! fallback.

use kubeforge_common::types::AppType;

/// Ordered `(signature, category)` rules. First match wins.
const SIGNATURES: &[(&str, AppType)] = &[
    ("eclipse-temurin", AppType::Java),
    ("temurin", AppType::Java),
    ("openjdk", AppType::Java),
    ("corretto", AppType::Java),
    ("zulu", AppType::Java),
    ("tomcat", AppType::Java),
    ("jetty", AppType::Java),
    ("node", AppType::Node),
    ("python", AppType::Python),
    ("pypy", AppType::Python),
    ("golang", AppType::Golang),
    ("nginx", AppType::Webserver),
    ("httpd", AppType::Webserver),
    ("caddy", AppType::Webserver),
    ("haproxy", AppType::Webserver),
    ("traefik", AppType::Webserver),
    ("redis", AppType::Redis),
    ("valkey", AppType::Redis),
    ("postgres", AppType::Postgres),
    ("mysql", AppType::Mysql),
    ("mariadb", AppType::Mysql),
    ("mongo", AppType::Mongo),
];

/// Infers the application category from an image repository name.
///
/// Matching is case-insensitive and considers the full reference, so
/// registry-qualified names like `docker.io/library/node` still match.
#[must_use]
pub fn infer(image: &str) -> AppType {
    let lowered = image.to_lowercase();
    for (signature, category) in SIGNATURES {
        if lowered.contains(signature) {
            return *category;
        }
    }
    AppType::Generic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_common_runtimes() {
        assert_eq!(infer("node"), AppType::Node);
        assert_eq!(infer("python"), AppType::Python);
        assert_eq!(infer("golang"), AppType::Golang);
        assert_eq!(infer("nginx"), AppType::Webserver);
        assert_eq!(infer("redis"), AppType::Redis);
        assert_eq!(infer("postgres"), AppType::Postgres);
    }

    #[test]
    fn infers_java_from_jvm_distributions() {
        assert_eq!(infer("eclipse-temurin"), AppType::Java);
        assert_eq!(infer("openjdk"), AppType::Java);
        assert_eq!(infer("amazoncorretto"), AppType::Java);
        assert_eq!(infer("tomcat"), AppType::Java);
    }

    #[test]
    fn matching_is_case_insensitive_and_registry_aware() {
        assert_eq!(infer("docker.io/library/Node"), AppType::Node);
        assert_eq!(infer("registry.example.com:5000/postgres"), AppType::Postgres);
    }

    #[test]
    fn unknown_image_falls_back_to_generic() {
        assert_eq!(infer("mycompany/backend"), AppType::Generic);
        assert_eq!(infer(""), AppType::Generic);
    }

    #[test]
    fn first_match_wins_for_composite_names() {
        // "tomcat-node" hits the Java rule before the Node rule.
        assert_eq!(infer("tomcat-node"), AppType::Java);
    }
}
