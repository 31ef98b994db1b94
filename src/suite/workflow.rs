//! Workflow seam and the per-suite context it runs in

use async_trait::async_trait;

use crate::common::Result;
use crate::driver::BrowserSession;
use crate::intercept::MutationLog;
use crate::scenario::ScenarioParameterSet;
use crate::state::{EntityStateStore, KeySchema};
use crate::upstream::{resolve_url, PageRequest, PageResponse};

/// The fixed sequence of steps a suite family runs for every scenario
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Number of steps, for progress reporting
    fn steps_total(&self) -> usize;

    async fn run(&self, ctx: &mut SuiteContext<'_>) -> Result<()>;
}

/// Everything one suite instance can touch
pub struct SuiteContext<'a> {
    label: String,
    session: Box<dyn BrowserSession>,
    scenario: &'a ScenarioParameterSet,
    schema: Option<&'a KeySchema>,
    base_url: Option<&'a str>,
    mutations: MutationLog,
    echo: bool,
    steps_run: usize,
}

impl<'a> SuiteContext<'a> {
    pub fn new(
        label: String,
        session: Box<dyn BrowserSession>,
        scenario: &'a ScenarioParameterSet,
        schema: Option<&'a KeySchema>,
        base_url: Option<&'a str>,
    ) -> Self {
        Self {
            label,
            session,
            scenario,
            schema,
            base_url,
            mutations: MutationLog::default(),
            echo: false,
            steps_run: 0,
        }
    }

    /// Print step progress to stdout
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn scenario(&self) -> &ScenarioParameterSet {
        self.scenario
    }

    pub fn echo(&self) -> bool {
        self.echo
    }

    pub fn session(&mut self) -> &mut dyn BrowserSession {
        self.session.as_mut()
    }

    /// Entity state store over this suite's session
    pub fn store(&mut self) -> EntityStateStore<'_> {
        EntityStateStore::new(self.session.as_mut(), self.schema)
    }

    /// Log of the mutator installed for this suite (empty if none)
    pub fn mutations(&self) -> &MutationLog {
        &self.mutations
    }

    pub(crate) fn set_mutations(&mut self, log: MutationLog) {
        self.mutations = log;
    }

    /// Issue a page request, resolving a relative URL against the base URL
    pub async fn request(&mut self, mut request: PageRequest) -> Result<PageResponse> {
        request.url = resolve_url(self.base_url, &request.url)?;
        self.session.request(request).await
    }

    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    /// Mark one workflow step as finished
    pub fn complete_step(&mut self) {
        self.steps_run += 1;
    }

    pub(crate) fn into_session(self) -> Box<dyn BrowserSession> {
        self.session
    }
}
