use std::collections::{BTreeSet, HashMap};
#[cfg(test)]
use std::collections::VecDeque;
use std::io::{BufRead, Write};

use log::{info, warn};

use crate::import::blogger::Post;
use crate::models::user::User;
use crate::store::Store;

/// Source of operator answers. One call per prompt, returning the typed line
/// without its trailing newline.
pub trait Prompter {
    fn ask(&mut self, prompt: &str) -> Result<String, String>;
}

/// Prompts on stdout, answers from stdin.
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask(&mut self, prompt: &str) -> Result<String, String> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(prompt.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| e.to_string())?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("Input closed while waiting for an answer".to_string());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Replays canned answers and records every prompt shown.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            prompts: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String, String> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| "Input closed while waiting for an answer".to_string())
    }
}

/// Normalized author name -> local user id
pub type AuthorMap = HashMap<String, i64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ChooseMode,
    ChooseExisting,
    EnterEmail,
}

/// Distinct normalized author names, sorted.
pub fn distinct_authors(posts: &[Post]) -> BTreeSet<String> {
    posts.iter().map(|p| p.author_name()).collect()
}

/// Map every post author to a local user, asking the operator for each one.
pub fn import_authors(
    store: &dyn Store,
    prompter: &mut dyn Prompter,
    posts: &[Post],
) -> Result<AuthorMap, String> {
    info!("- Importing authors");
    let authors = distinct_authors(posts);
    info!("> {} authors found.", authors.len());

    let mut map = AuthorMap::new();
    for author in authors {
        let user = resolve_author(store, prompter, &author)?;
        info!("> Author '{}' mapped to user '{}'", author, user.username);
        map.insert(author, user.id);
    }
    Ok(map)
}

/// Drive the mode / existing-user / new-user prompts until `author_name`
/// is bound to a user. `back` always returns to the mode choice.
pub fn resolve_author(
    store: &dyn Store,
    prompter: &mut dyn Prompter,
    author_name: &str,
) -> Result<User, String> {
    let mut step = Step::ChooseMode;
    loop {
        step = match step {
            Step::ChooseMode => {
                let text = format!(
                    "The author '{}' needs to be migrated to an user:\n\
                     1. Use an existing user ?\n\
                     2. Create a new user ?\n\
                     Please select a choice: ",
                    author_name
                );
                match prompter.ask(&text)?.trim() {
                    "1" => Step::ChooseExisting,
                    "2" => Step::EnterEmail,
                    _ => Step::ChooseMode,
                }
            }
            Step::ChooseExisting => {
                let users = store.user_list_all();
                match users.len() {
                    0 => {
                        warn!("No existing users to choose from, please create one");
                        Step::ChooseMode
                    }
                    1 => return Ok(users[0].clone()),
                    _ => match choose_existing(prompter, &users, author_name)? {
                        Some(user) => return Ok(user),
                        None => Step::ChooseMode,
                    },
                }
            }
            Step::EnterEmail => {
                let text = format!(
                    "2. Please type the email of the '{}' user or 'back': ",
                    author_name
                );
                let email = prompter.ask(&text)?;
                if email.trim() == "back" {
                    Step::ChooseMode
                } else {
                    return create_user(store, author_name, email.trim());
                }
            }
        };
    }
}

/// Username list prompt. `None` means the operator typed `back`.
fn choose_existing(
    prompter: &mut dyn Prompter,
    users: &[User],
    author_name: &str,
) -> Result<Option<User>, String> {
    let preselected = users.iter().find(|u| u.username == author_name);
    let display: Vec<String> = users
        .iter()
        .map(|u| {
            if u.username == author_name {
                format!("[{}]", u.username)
            } else {
                u.username.clone()
            }
        })
        .collect();
    let text = format!(
        "1. Select your user, by typing one of theses usernames:\n\
         {} or 'back'\n\
         Please select a choice: ",
        display.join(", ")
    );

    loop {
        let answer = prompter.ask(&text)?;
        if let Some(user) = users.iter().find(|u| u.username == answer) {
            return Ok(Some(user.clone()));
        }
        if answer.is_empty() {
            if let Some(user) = preselected {
                return Ok(Some(user.clone()));
            }
        }
        if answer.trim() == "back" {
            return Ok(None);
        }
    }
}

/// Create the user, or reuse the one that already holds the username.
fn create_user(store: &dyn Store, username: &str, email: &str) -> Result<User, String> {
    match store.user_create(username, email) {
        Ok(id) => store
            .user_get_by_id(id)
            .ok_or_else(|| format!("User {} vanished after creation", id)),
        Err(e) => store.user_get_by_username(username).ok_or(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::blogger::Author;
    use crate::store::sqlite::SqliteStore;

    fn test_store() -> SqliteStore {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        let store = SqliteStore::new(pool);
        store.run_migrations().unwrap();
        store.seed_defaults().unwrap();
        store
    }

    fn post_by(name: &str) -> Post {
        Post {
            id: "1".to_string(),
            title: "T".to_string(),
            content: None,
            published: None,
            author: Author {
                display_name: name.to_string(),
            },
            labels: vec![],
            url: None,
        }
    }

    #[test]
    fn single_user_is_preselected_silently() {
        let store = test_store();
        let id = store.user_create("admin", "admin@example.com").unwrap();
        let mut prompter = ScriptedPrompter::new(&["1"]);

        let user = resolve_author(&store, &mut prompter, "John-Doe").unwrap();
        assert_eq!(user.id, id);
        assert_eq!(prompter.prompts.len(), 1);
        assert!(prompter.prompts[0].contains("needs to be migrated"));
    }

    #[test]
    fn invalid_mode_choice_reprompts() {
        let store = test_store();
        store.user_create("admin", "").unwrap();
        let mut prompter = ScriptedPrompter::new(&["x", "12", "", "1"]);
        resolve_author(&store, &mut prompter, "Jane").unwrap();
        assert_eq!(prompter.prompts.len(), 4);
    }

    #[test]
    fn existing_user_by_name_or_default() {
        let store = test_store();
        store.user_create("admin", "").unwrap();
        let jane = store.user_create("Jane", "").unwrap();

        let mut prompter = ScriptedPrompter::new(&["1", "admin"]);
        let user = resolve_author(&store, &mut prompter, "Jane").unwrap();
        assert_eq!(user.username, "admin");
        assert!(prompter.prompts[1].contains("admin, [Jane] or 'back'"));

        let mut prompter = ScriptedPrompter::new(&["1", ""]);
        let user = resolve_author(&store, &mut prompter, "Jane").unwrap();
        assert_eq!(user.id, jane);
    }

    #[test]
    fn empty_answer_without_default_reprompts() {
        let store = test_store();
        store.user_create("admin", "").unwrap();
        store.user_create("editor", "").unwrap();
        let mut prompter = ScriptedPrompter::new(&["1", "", "nobody", "editor"]);
        let user = resolve_author(&store, &mut prompter, "Jane").unwrap();
        assert_eq!(user.username, "editor");
        assert_eq!(prompter.prompts.len(), 4);
    }

    #[test]
    fn back_restarts_from_mode_choice() {
        let store = test_store();
        store.user_create("admin", "").unwrap();
        store.user_create("editor", "").unwrap();
        let mut prompter =
            ScriptedPrompter::new(&["1", "back", "2", "back", "2", "jane@example.com"]);
        let user = resolve_author(&store, &mut prompter, "Jane").unwrap();
        assert_eq!(user.username, "Jane");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(prompter.prompts.len(), 6);
    }

    #[test]
    fn create_falls_back_to_existing_username() {
        let store = test_store();
        let existing = store.user_create("Jane", "old@example.com").unwrap();
        let mut prompter = ScriptedPrompter::new(&["2", "new@example.com"]);
        let user = resolve_author(&store, &mut prompter, "Jane").unwrap();
        assert_eq!(user.id, existing);
        assert_eq!(user.email, "old@example.com");
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn no_users_returns_to_mode_choice() {
        let store = test_store();
        let mut prompter = ScriptedPrompter::new(&["1", "2", "a@b.c"]);
        let user = resolve_author(&store, &mut prompter, "Jane").unwrap();
        assert_eq!(user.username, "Jane");
    }

    #[test]
    fn exhausted_input_is_an_error() {
        let store = test_store();
        let mut prompter = ScriptedPrompter::new(&["maybe"]);
        assert!(resolve_author(&store, &mut prompter, "Jane").is_err());
    }

    #[test]
    fn import_authors_maps_each_distinct_name_once() {
        let store = test_store();
        let posts = vec![post_by("John Doe"), post_by("Jane"), post_by("John Doe")];
        let mut prompter = ScriptedPrompter::new(&["2", "jane@x.org", "2", "john@x.org"]);

        let map = import_authors(&store, &mut prompter, &posts).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            store.user_get_by_id(map["John-Doe"]).unwrap().email,
            "john@x.org"
        );
        assert_eq!(store.user_get_by_id(map["Jane"]).unwrap().email, "jane@x.org");
    }
}
