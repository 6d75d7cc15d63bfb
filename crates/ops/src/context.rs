//! Operations context and its builder

use std::sync::Arc;

use portpatch_apply::{GnuPatch, PatchApplier, PatchTool};
use portpatch_config::Config;
use portpatch_errors::{Error, OpsError};
use portpatch_events::EventSender;
use portpatch_net::{NetClient, NetConfig};
use portpatch_platform::PlatformContext;
use portpatch_resolver::PatchResolver;

/// Everything an operation needs, wired once per invocation
pub struct OpsCtx {
    /// Remote patch discovery
    pub resolver: PatchResolver,
    /// Validate-then-commit applier
    pub applier: PatchApplier,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Effective configuration after all layers are merged
    pub config: Config,
}

impl OpsCtx {
    /// Wire the default components from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or a discovery strategy cannot be
    /// constructed.
    pub fn from_config(config: Config, tx: EventSender) -> Result<Self, Error> {
        let net = NetClient::new(&NetConfig::from(&config.network))?;
        let resolver = PatchResolver::from_config(net, &config, tx.clone())?;
        let tool = GnuPatch::from_config(&config.patch)
            .with_context(PlatformContext::new(Some(tx.clone())));

        OpsContextBuilder::new()
            .with_resolver(resolver)
            .with_patch_tool(Arc::new(tool))
            .with_event_sender(tx)
            .with_config(config)
            .build()
    }
}

/// Builder for [`OpsCtx`]
pub struct OpsContextBuilder {
    resolver: Option<PatchResolver>,
    tool: Option<Arc<dyn PatchTool>>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: None,
            tool: None,
            tx: None,
            config: None,
        }
    }

    /// Set resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: PatchResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the tool used for dry runs and commits
    #[must_use]
    pub fn with_patch_tool(mut self, tool: Arc<dyn PatchTool>) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if any required component is missing.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let missing = |component: &str| OpsError::MissingComponent {
            component: component.to_string(),
        };

        let resolver = self.resolver.ok_or_else(|| missing("resolver"))?;
        let tool = self.tool.ok_or_else(|| missing("patch_tool"))?;
        let tx = self.tx.ok_or_else(|| missing("event_sender"))?;
        let config = self.config.ok_or_else(|| missing("config"))?;

        Ok(OpsCtx {
            resolver,
            applier: PatchApplier::new(tool, tx.clone()),
            tx,
            config,
        })
    }
}

impl Default for OpsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
