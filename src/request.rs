use crate::core::models::{poll::PollCreate, response::Submit};
use crate::core::services::poll::MAX_OPTIONS;
use crate::error::Error;
use url::form_urlencoded;

/// Fields of the "Create Vote" form as typed, kept so the form can be re-rendered after a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePollForm {
    pub question: String,
    pub max_selections: String,
    pub options: Vec<String>,
}

impl Default for CreatePollForm {
    fn default() -> Self {
        Self {
            question: String::new(),
            max_selections: "1".into(),
            options: vec![String::new(); MAX_OPTIONS],
        }
    }
}

impl CreatePollForm {
    pub fn parse(body: &[u8]) -> Self {
        let mut form = CreatePollForm {
            options: Vec::new(),
            ..Default::default()
        };
        for (k, v) in form_urlencoded::parse(body) {
            match k.as_ref() {
                "question" => form.question = v.into_owned(),
                "max_selections" => form.max_selections = v.into_owned(),
                "option" => form.options.push(v.into_owned()),
                _ => {}
            }
        }
        if form.options.len() < MAX_OPTIONS {
            form.options.resize(MAX_OPTIONS, String::new());
        }
        form
    }

    pub fn to_create(&self) -> Result<PollCreate, Error> {
        let max_selections = self
            .max_selections
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::Validation("Maximum selections must be a positive whole number".into()))?;
        Ok(PollCreate {
            question: self.question.clone(),
            max_selections,
            options: self.options.clone(),
        })
    }
}

/// Parses the voting form, where every checked option arrives as a repeated `option` field.
pub fn parse_vote_form(body: &[u8]) -> Result<Submit, Error> {
    let option_ids = form_urlencoded::parse(body)
        .filter(|(k, _)| k == "option")
        .map(|(_, v)| v.trim().parse::<i64>().map_err(|_| Error::Validation(format!("Invalid option: {}", v))))
        .collect::<Result<Vec<i64>, Error>>()?;
    Ok(Submit { option_ids })
}
