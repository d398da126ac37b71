use k8s_openapi::api::core::v1::SecurityContext;

/// A builder for [`SecurityContext`] objects (not to be confused with `PodSecurityContext`).
#[derive(Clone, Default)]
pub struct SecurityContextBuilder {
    security_context: SecurityContext,
}

impl SecurityContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_privilege_escalation(&mut self, value: bool) -> &mut Self {
        self.security_context.allow_privilege_escalation = Some(value);
        self
    }

    pub fn run_as_group(&mut self, value: i64) -> &mut Self {
        self.security_context.run_as_group = Some(value);
        self
    }

    pub fn run_as_user(&mut self, value: i64) -> &mut Self {
        self.security_context.run_as_user = Some(value);
        self
    }

    pub fn build(&self) -> SecurityContext {
        self.security_context.clone()
    }
}
