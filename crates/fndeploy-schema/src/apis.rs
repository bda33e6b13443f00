use crate::manifest::{ManifestError, PackageSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `base-path → relative-path → action-name → http-method`.
pub type ApiSpec = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// One gateway route bound to a backend action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiDoc {
    pub namespace: String,
    pub api_name: String,
    pub gateway_base_path: String,
    pub gateway_rel_path: String,
    pub gateway_method: String,
    pub action: ApiAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiAction {
    /// Package-qualified action name.
    pub name: String,
    pub namespace: String,
    pub backend_method: String,
}

impl PackageSpec {
    /// Expand the nested `apis` section into one [`ApiDoc`] per route.
    ///
    /// Paths gain a leading `/` when missing and methods are upper-cased.
    pub fn api_docs(
        &self,
        package_name: &str,
        namespace: &str,
    ) -> Result<Vec<ApiDoc>, ManifestError> {
        let mut docs = Vec::new();
        for (api_name, base_paths) in &self.apis {
            for (base_path, rel_paths) in base_paths {
                for (rel_path, actions) in rel_paths {
                    for (action_name, method) in actions {
                        let method = method.trim().to_uppercase();
                        if !HTTP_METHODS.contains(&method.as_str()) {
                            return Err(ManifestError::InvalidApiMethod {
                                api: api_name.clone(),
                                method,
                            });
                        }
                        docs.push(ApiDoc {
                            namespace: namespace.to_owned(),
                            api_name: api_name.clone(),
                            gateway_base_path: with_leading_slash(base_path),
                            gateway_rel_path: with_leading_slash(rel_path),
                            gateway_method: method.clone(),
                            action: ApiAction {
                                name: format!("{package_name}/{action_name}"),
                                namespace: namespace.to_owned(),
                                backend_method: method,
                            },
                        });
                    }
                }
            }
        }
        Ok(docs)
    }
}

fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use crate::manifest::parse_manifest_str;

    #[test]
    fn expands_nested_routes() {
        let manifest = parse_manifest_str(
            r"
packages:
  books:
    apis:
      library:
        catalog:
          books:
            list_books: get
            add_book: POST
",
        )
        .unwrap();
        let docs = manifest.packages["books"].api_docs("books", "guest").unwrap();
        assert_eq!(docs.len(), 2);
        let add = docs.iter().find(|d| d.action.name == "books/add_book").unwrap();
        assert_eq!(add.gateway_base_path, "/catalog");
        assert_eq!(add.gateway_rel_path, "/books");
        assert_eq!(add.gateway_method, "POST");
        let list = docs.iter().find(|d| d.action.name == "books/list_books").unwrap();
        assert_eq!(list.gateway_method, "GET");
        assert_eq!(list.api_name, "library");
    }

    #[test]
    fn rejects_unknown_methods() {
        let manifest = parse_manifest_str(
            r"
packages:
  books:
    apis:
      library:
        /catalog:
          /books:
            list_books: FETCH
",
        )
        .unwrap();
        assert!(manifest.packages["books"].api_docs("books", "guest").is_err());
    }
}
