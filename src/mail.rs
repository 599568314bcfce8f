//! Outbound email: the one external collaborator the verification flow
//! depends on. Failures surface as [`Error::DeliveryFailed`]; the caller
//! decides what that means for its own state (registration aborts entirely).

use aws_sdk_sesv2::Client as SesClient;

use crate::error::Result;

#[cfg(not(test))]
use crate::error::Error;

/// Cap in seconds on a single SES call, so a wedged mail backend cannot
/// hang a request.
#[cfg(not(test))]
const SEND_TIMEOUT_SECS: u64 = 10;

#[cfg(not(test))]
const CHARSET: &str = "UTF-8";

/// Send a plain-text email. Returns `DeliveryFailed` if the message was
/// rejected or the send timed out.
#[cfg_attr(test, allow(unused_variables))]
pub async fn send(
    sender: &SesClient,
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<()> {
    // Local test builds have no mail backend to talk to.
    #[cfg(not(test))]
    {
        use aws_sdk_sesv2::model::{Body, Content, Destination, EmailContent, Message};
        use rocket::tokio::time::timeout;
        use std::time::Duration;

        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(Content::builder().data(subject).charset(CHARSET).build())
                    .body(
                        Body::builder()
                            .text(Content::builder().data(body).charset(CHARSET).build())
                            .build(),
                    )
                    .build(),
            )
            .build();

        let send = sender
            .send_email()
            .from_email_address(from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(content)
            .send();

        match timeout(Duration::from_secs(SEND_TIMEOUT_SECS), send).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(Error::DeliveryFailed(err.to_string())),
            Err(_) => {
                return Err(Error::DeliveryFailed(format!(
                    "send timed out after {SEND_TIMEOUT_SECS}s"
                )))
            }
        }
    }

    Ok(())
}
