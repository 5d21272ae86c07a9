//! Newsletter dispatch - per-recipient delivery and outcome tallying.

use crate::domain::{Post, Subscriber};
use crate::ports::{Email, Mailer};

/// Outcome of a newsletter dispatch over a recipient set.
///
/// Invariant: `sent + failed` equals the number of recipients attempted,
/// and `errors` holds exactly one diagnostic per failed recipient.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Send a newsletter for `post` to each subscriber, one at a time.
///
/// One delivery attempt per recipient; no retry, no batching. A failed
/// delivery is tallied and recorded, it never aborts the remaining
/// recipients.
pub async fn send_newsletter<M: Mailer + ?Sized>(
    mailer: &M,
    post: &Post,
    subscribers: &[Subscriber],
    base_url: &str,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    tracing::info!(
        title = %post.title,
        recipients = subscribers.len(),
        "Sending newsletter"
    );

    let subject = format!("New Post: {}", post.title);
    let text = render_text(post, base_url);
    let html = render_html(post, base_url);

    for subscriber in subscribers {
        let email = Email {
            to: subscriber.email.clone(),
            subject: subject.clone(),
            text: text.clone(),
            html: html.clone(),
        };

        match mailer.send(&email).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                report
                    .errors
                    .push(format!("Failed to send to {}: {}", subscriber.email, e));
            }
        }
    }

    tracing::info!(
        sent = report.sent,
        failed = report.failed,
        "Newsletter dispatch finished"
    );

    report
}

fn render_text(post: &Post, base_url: &str) -> String {
    format!(
        "New Post Published: {title}\n\n\
         {content}\n\n\
         ---\n\
         Read the full post online: {base_url}/posts/{slug}\n\n\
         Thanks for subscribing to our newsletter!",
        title = post.title,
        content = post.content,
        base_url = base_url,
        slug = post.slug,
    )
}

fn render_html(post: &Post, base_url: &str) -> String {
    let paragraphs: String = post
        .content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect();

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body>\n\
         <h1>Personal Newsletter</h1>\n\
         <h2>{title}</h2>\n\
         <div>{paragraphs}</div>\n\
         <p><a href=\"{base_url}/posts/{slug}\">Read Full Post</a></p>\n\
         <p>Thanks for subscribing to our newsletter!</p>\n\
         </body>\n\
         </html>",
        title = escape_html(&post.title),
        paragraphs = paragraphs,
        base_url = base_url,
        slug = post.slug,
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MailerError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Mailer that fails for addresses listed in `reject`.
    struct ScriptedMailer {
        reject: Vec<String>,
        delivered: Mutex<Vec<String>>,
    }

    impl ScriptedMailer {
        fn rejecting(reject: &[&str]) -> Self {
            Self {
                reject: reject.iter().map(|s| s.to_string()).collect(),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Mailer for ScriptedMailer {
        async fn send(&self, email: &Email) -> Result<(), MailerError> {
            if self.reject.contains(&email.to) {
                return Err(MailerError::Delivery("mailbox unavailable".into()));
            }
            self.delivered.lock().unwrap().push(email.to.clone());
            Ok(())
        }
    }

    fn post() -> Post {
        let mut post = Post::new("Hello".into(), "Body text".into(), "hello".into());
        post.published = true;
        post
    }

    fn subscribers(emails: &[&str]) -> Vec<Subscriber> {
        emails
            .iter()
            .map(|e| Subscriber::new(e.to_string(), None))
            .collect()
    }

    #[tokio::test]
    async fn counts_sum_to_recipient_count() {
        let mailer = ScriptedMailer::rejecting(&["b@example.com"]);
        let subs = subscribers(&["a@example.com", "b@example.com", "c@example.com"]);

        let report = send_newsletter(&mailer, &post(), &subs, "http://localhost:3000").await;

        assert_eq!(report.sent + report.failed, subs.len());
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), report.failed);
        assert!(report.errors[0].contains("b@example.com"));
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_recipients() {
        let mailer = ScriptedMailer::rejecting(&["a@example.com"]);
        let subs = subscribers(&["a@example.com", "b@example.com"]);

        send_newsletter(&mailer, &post(), &subs, "http://localhost:3000").await;

        let delivered = mailer.delivered.lock().unwrap();
        assert_eq!(delivered.as_slice(), ["b@example.com"]);
    }

    #[tokio::test]
    async fn empty_recipient_set_is_a_noop() {
        let mailer = ScriptedMailer::rejecting(&[]);
        let report = send_newsletter(&mailer, &post(), &[], "http://localhost:3000").await;

        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn html_body_escapes_content() {
        let mut p = post();
        p.content = "a <b> & c".into();
        let html = render_html(&p, "http://localhost:3000");
        assert!(html.contains("a &lt;b&gt; &amp; c"));
    }
}
