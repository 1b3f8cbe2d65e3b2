//! Connector that builds Octocrab gateways once the token is known.

use std::sync::Arc;

use crate::github::error::WidgetError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};

use super::issues::OctocrabIssueGateway;
use super::{GatewayConnector, IssueGateway};

/// Builds [`OctocrabIssueGateway`] instances for one repository.
#[derive(Debug, Clone)]
pub struct OctocrabConnector {
    locator: RepositoryLocator,
}

impl OctocrabConnector {
    /// Creates a connector for the repository.
    #[must_use]
    pub const fn new(locator: RepositoryLocator) -> Self {
        Self { locator }
    }
}

impl GatewayConnector for OctocrabConnector {
    fn connect(
        &self,
        token: Option<&PersonalAccessToken>,
    ) -> Result<Arc<dyn IssueGateway>, WidgetError> {
        let gateway = OctocrabIssueGateway::for_token(token, &self.locator)?;
        Ok(Arc::new(gateway))
    }
}
