//! Built-in artifact templates, one per action kind.

use crate::actions::ActionKind;

const CREATE: &str = include_str!("../../templates/CreateAction.json.hbs");
const READ: &str = include_str!("../../templates/ReadAction.json.hbs");
const UPDATE: &str = include_str!("../../templates/UpdateAction.json.hbs");
const DELETE: &str = include_str!("../../templates/DeleteAction.json.hbs");
const SEARCH: &str = include_str!("../../templates/SearchAction.json.hbs");

pub fn source(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Create => CREATE,
        ActionKind::Read => READ,
        ActionKind::Update => UPDATE,
        ActionKind::Delete => DELETE,
        ActionKind::Search => SEARCH,
    }
}
