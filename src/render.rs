use crate::core::models::poll::{Poll, PollDetail};
use crate::request::CreatePollForm;
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    fn html(&self) -> String {
        let (class, text) = match self {
            Notice::Success(t) => ("success", t),
            Notice::Info(t) => ("info", t),
            Notice::Warning(t) => ("warning", t),
            Notice::Error(t) => ("error", t),
        };
        format!(r#"<p class="notice {}">{}</p>"#, class, escape(text))
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn notices(notices: &[Notice]) -> String {
    notices.iter().map(Notice::html).join("\n")
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 56rem; margin: 2rem auto; padding: 0 1rem; }
header { display: flex; justify-content: space-between; align-items: center; }
.notice { padding: .5rem .75rem; border-radius: 4px; }
.success { background: #e6f4ea; } .info { background: #e8f0fe; }
.warning { background: #fef7e0; } .error { background: #fce8e6; }
.poll { display: flex; justify-content: space-between; border-bottom: 1px solid #ddd; padding: .5rem 0; }
table { width: 100%; border-collapse: collapse; } td, th { text-align: left; padding: .25rem .5rem; }
.bar { background: #4285f4; height: 1rem; }
form.create input[type=text] { display: block; width: 100%; margin-bottom: .25rem; }
code { background: #f1f3f4; padding: .25rem .5rem; }
"#;

pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title><style>{style}</style></head>
<body>
<header><h1><a href="/">Anonymous Vote</a></h1><a class="button" href="/?create=1">+ Create Vote</a></header>
{body}
</body>
</html>"#,
        title = escape(title),
        style = STYLE,
        body = body
    )
}

pub fn create_form(form: &CreatePollForm, warnings: &[Notice]) -> String {
    let options = form
        .options
        .iter()
        .enumerate()
        .map(|(i, v)| format!(r#"<input type="text" name="option" placeholder="Option {}" value="{}">"#, i + 1, escape(v)))
        .join("\n");
    format!(
        r#"<section>
<h2>Create New Vote</h2>
{notices}
<form class="create" method="post" action="/polls">
<label>Question <input type="text" name="question" value="{question}"></label>
<label>Maximum selections allowed <input type="number" name="max_selections" min="1" value="{max}"></label>
<p>Options:</p>
{options}
<button type="submit">Create Vote</button> <a href="/">Cancel</a>
</form>
</section>"#,
        notices = notices(warnings),
        question = escape(&form.question),
        max = escape(&form.max_selections),
        options = options
    )
}

pub fn poll_list(polls: &[Poll], page_notices: &[Notice]) -> String {
    let items = if polls.is_empty() {
        Notice::Info("No votes available. Create one to get started!".into()).html()
    } else {
        polls
            .iter()
            .map(|p| {
                let created = p.created_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "unknown".into());
                format!(
                    r#"<div class="poll"><div><h3>{}</h3><p>Created: {}</p></div><a href="/?vote_id={}">Vote</a></div>"#,
                    escape(&p.question),
                    created,
                    escape(&p.public_id)
                )
            })
            .join("\n")
    };
    format!("{}\n<h2>Available Votes</h2>\n{}", notices(page_notices), items)
}

pub fn listing_page(polls: &[Poll], form: Option<&CreatePollForm>, page_notices: &[Notice], form_notices: &[Notice]) -> String {
    let form = form.map(|f| create_form(f, form_notices)).unwrap_or_default();
    layout("Anonymous Vote", &format!("{}\n{}", form, poll_list(polls, page_notices)))
}

pub fn share_url(public_url: &str, poll: &Poll) -> String {
    format!("{}/?vote_id={}", public_url, poll.public_id)
}

pub fn poll_page(detail: &PollDetail, public_url: &str, page_notices: &[Notice]) -> String {
    let poll = &detail.poll;
    let input = if poll.is_single_select() { "radio" } else { "checkbox" };
    let prompt = if poll.is_single_select() {
        "Select your answer:".to_owned()
    } else {
        format!("Select up to {} options:", poll.max_selections)
    };
    let choices = detail
        .options
        .iter()
        .map(|o| format!(r#"<label><input type="{}" name="option" value="{}"> {}</label><br>"#, input, o.id, escape(&o.text)))
        .join("\n");
    let rows = detail
        .results
        .iter()
        .map(|r| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td><div class="bar" style="width: {:.1}%"></div></td></tr>"#,
                escape(&r.option),
                r.votes,
                r.label,
                r.percentage
            )
        })
        .join("\n");
    let action = format!("/polls/{}/responses", escape(&poll.public_id));
    let body = format!(
        r#"<h2>{question}</h2>
{notices}
<form method="post" action="{action}">
<p>{prompt}</p>
{choices}
<button type="submit">Submit Vote</button>
</form>
<h3>Current Results</h3>
<p>{responses}</p>
<table>
<tr><th>Option</th><th>Votes</th><th>Percentage</th><th></th></tr>
{rows}
</table>
<h3>Share this vote</h3>
<code>{share}</code>"#,
        question = escape(&poll.question),
        notices = notices(page_notices),
        action = action,
        prompt = prompt,
        choices = choices,
        responses = response_count(detail.responses),
        rows = rows,
        share = escape(&share_url(public_url, poll))
    );
    layout(&poll.question, &body)
}

fn response_count(n: usize) -> String {
    match n {
        1 => "1 response".to_owned(),
        n => format!("{} responses", n),
    }
}

pub fn message_page(title: &str, page_notices: &[Notice]) -> String {
    layout(title, &format!(r#"{}<p><a href="/">Back to all votes</a></p>"#, notices(page_notices)))
}
