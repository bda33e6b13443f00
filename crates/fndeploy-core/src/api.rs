use crate::composer::ComposeContext;
use crate::entity::ApiCreateRequest;
use crate::ComposeError;
use fndeploy_schema::PackageSpec;

/// Wrap each expanded gateway route of a package into a create request.
pub fn compose_apis(
    ctx: &ComposeContext<'_>,
    package_name: &str,
    package: &PackageSpec,
) -> Result<Vec<ApiCreateRequest>, ComposeError> {
    let namespace = ctx.namespace_or(&package.namespace);
    Ok(package
        .api_docs(package_name, &namespace)?
        .into_iter()
        .map(|api_doc| ApiCreateRequest { api_doc })
        .collect())
}
