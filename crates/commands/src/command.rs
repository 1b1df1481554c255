use {
    async_trait::async_trait,
    weft_common::{CommandArgs, Response},
    weft_platform::PlatformClient,
};

/// A named command handler.
///
/// Implementations must not depend on how they were invoked; every
/// invocation shape reaches them as the same normalized argument bag.
#[async_trait]
pub trait Command: Send + Sync {
    /// Whether the response should be visible only to the invoking user.
    /// Decided before execution; the platform acknowledgment pins it.
    fn is_private(&self, args: &CommandArgs) -> bool;

    async fn execute(
        &self,
        client: &dyn PlatformClient,
        args: &CommandArgs,
    ) -> weft_common::Result<Response>;
}
