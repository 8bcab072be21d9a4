use hbnb::console::{Console, Flow};
use hbnb::persist::PersistenceMode;
use hbnb::storage::Storage;
use serde_json::json;

fn setup() -> Console {
    Console::new(Storage::new(PersistenceMode::InMemory))
}

fn run(console: &mut Console, line: &str) -> String {
    console.execute_collect(line).expect("command ok").text()
}

#[test]
fn create_then_show() {
    let mut console = setup();
    let id = run(&mut console, "create State");
    assert_eq!(id.len(), 36, "uuid shaped id expected, got {id}");
    assert_eq!(id.matches('-').count(), 4);
    let shown = run(&mut console, &format!("show State {id}"));
    assert!(shown.starts_with(&format!("[State] ({id}) {{'id': '{id}'")));
    assert!(shown.contains("'created_at': '"));
    assert!(shown.contains("'name': ''"));
    assert_eq!(console.storage().flushes(), 1);
}

#[test]
fn create_errors_in_order() {
    let mut console = setup();
    assert_eq!(run(&mut console, "create"), "** class name missing **");
    assert_eq!(run(&mut console, "create Galaxy"), "** class doesn't exist **");
    assert_eq!(run(&mut console, "create user"), "** class doesn't exist **");
    assert!(console.storage().is_empty());
    assert_eq!(console.storage().flushes(), 0);
}

#[test]
fn show_and_destroy_errors_in_order() {
    let mut console = setup();
    for verb in ["show", "destroy"] {
        assert_eq!(run(&mut console, verb), "** class name missing **");
        assert_eq!(run(&mut console, &format!("{verb} Galaxy")), "** class doesn't exist **");
        assert_eq!(run(&mut console, &format!("{verb} Galaxy 1234")), "** class doesn't exist **");
        assert_eq!(run(&mut console, &format!("{verb} User")), "** instance id missing **");
        assert_eq!(run(&mut console, &format!("{verb} User 1234")), "** no instance found **");
    }
}

#[test]
fn destroy_removes_and_saves() {
    let mut console = setup();
    let id = run(&mut console, "create User");
    let flushes = console.storage().flushes();
    assert_eq!(run(&mut console, &format!("destroy User {id}")), "");
    assert!(console.storage().is_empty());
    assert_eq!(console.storage().flushes(), flushes + 1);
    assert_eq!(run(&mut console, &format!("show User {id}")), "** no instance found **");
}

#[test]
fn destroy_unknown_id_keeps_store() {
    let mut console = setup();
    run(&mut console, "create City");
    let flushes = console.storage().flushes();
    assert_eq!(run(&mut console, "destroy City not-an-id"), "** no instance found **");
    assert_eq!(console.storage().len(), 1);
    assert_eq!(console.storage().flushes(), flushes);
}

#[test]
fn destroy_requires_matching_class() {
    let mut console = setup();
    let id = run(&mut console, "create Place");
    assert_eq!(run(&mut console, &format!("destroy City {id}")), "** no instance found **");
    assert_eq!(console.storage().len(), 1);
}

#[test]
fn all_lists_in_creation_order() {
    let mut console = setup();
    assert_eq!(run(&mut console, "all"), "[]");
    let first = run(&mut console, "create State");
    let user = run(&mut console, "create User");
    let second = run(&mut console, "create State");

    let states = run(&mut console, "all State");
    assert!(states.starts_with("[\"[State]"));
    assert!(!states.contains(&user));
    let at_first = states.find(&first).expect("first listed");
    let at_second = states.find(&second).expect("second listed");
    assert!(at_first < at_second);

    let everything = run(&mut console, "all");
    assert!(everything.contains(&user) && everything.contains(&first));
    assert_eq!(run(&mut console, "all Galaxy"), "** class doesn't exist **");
}

#[test]
fn count_by_class() {
    let mut console = setup();
    assert_eq!(run(&mut console, "count"), "** class name missing **");
    assert_eq!(run(&mut console, "count Galaxy"), "** class doesn't exist **");
    assert_eq!(run(&mut console, "count Review"), "0");
    run(&mut console, "create Review");
    run(&mut console, "create Review");
    run(&mut console, "create User");
    assert_eq!(run(&mut console, "count Review"), "2");
    assert_eq!(run(&mut console, "count User"), "1");
}

#[test]
fn update_errors_in_order() {
    let mut console = setup();
    let id = run(&mut console, "create User");
    assert_eq!(run(&mut console, "update"), "** class name missing **");
    assert_eq!(run(&mut console, "update Galaxy"), "** class doesn't exist **");
    assert_eq!(run(&mut console, "update User"), "** instance id missing **");
    assert_eq!(run(&mut console, "update User 1234"), "** no instance found **");
    assert_eq!(run(&mut console, "update User 1234 first_name"), "** no instance found **");
    assert_eq!(run(&mut console, &format!("update User {id}")), "** attribute name missing **");
    assert_eq!(run(&mut console, &format!("update User {id} first_name")), "** value missing **");
    assert_eq!(console.storage().flushes(), 1);
}

#[test]
fn update_assigns_and_refreshes() {
    let mut console = setup();
    let id = run(&mut console, "create User");
    let key = format!("User.{id}");
    let before = console.storage().get(&key).expect("stored").updated_at();
    assert_eq!(run(&mut console, &format!("update User {id} first_name \"Betty Holberton\"")), "");
    let user = console.storage().get(&key).expect("stored");
    assert_eq!(user.get("first_name"), Some(&json!("Betty Holberton")));
    assert!(user.updated_at() > before);
    assert_eq!(console.storage().flushes(), 2);
}

#[test]
fn update_value_typing() {
    let mut console = setup();
    let id = run(&mut console, "create User");
    let key = format!("User.{id}");
    run(&mut console, &format!("update User {id} age 89"));
    run(&mut console, &format!("update User {id} height 1.75"));
    run(&mut console, &format!("update User {id} code \"007\""));
    run(&mut console, &format!("update User {id} nick b3tty"));
    run(&mut console, &format!("update User {id} version 1.2.3"));
    let user = console.storage().get(&key).expect("stored");
    assert_eq!(user.get("age"), Some(&json!(89)));
    assert_eq!(user.get("height"), Some(&json!(1.75)));
    assert_eq!(user.get("code"), Some(&json!("007")));
    assert_eq!(user.get("nick"), Some(&json!("b3tty")));
    assert_eq!(user.get("version"), Some(&json!("1.2.3")));
}

#[test]
fn update_uses_declared_coercions() {
    let mut console = setup();
    let id = run(&mut console, "create Place");
    let key = format!("Place.{id}");
    run(&mut console, &format!("update Place {id} number_rooms \"4\""));
    run(&mut console, &format!("update Place {id} latitude 12"));
    run(&mut console, &format!("update Place {id} name 42"));
    let place = console.storage().get(&key).expect("stored");
    assert_eq!(place.get("number_rooms"), Some(&json!(4)));
    assert_eq!(place.get("latitude"), Some(&json!(12.0)));
    assert_eq!(place.get("name"), Some(&json!("42")));
}

#[test]
fn identity_cannot_be_updated() {
    let mut console = setup();
    let id = run(&mut console, "create State");
    assert_eq!(
        run(&mut console, &format!("update State {id} id \"other\"")),
        "** attribute can't be updated **"
    );
    assert!(console.storage().get(&format!("State.{id}")).is_some());
    assert_eq!(console.storage().flushes(), 1);
}

#[test]
fn create_with_parameters() {
    let mut console = setup();
    let id = run(
        &mut console,
        r#"create User first_name="John" email="john@example.com" password="1234""#,
    );
    assert_eq!(console.storage().flushes(), 1);
    let users = run(&mut console, "all User");
    assert!(users.contains(&id));
    assert!(users.contains("'first_name': 'John'"));
    assert!(users.contains("'email': 'john@example.com'"));
    assert!(users.contains("'password': '1234'"));
    assert!(users.contains("'last_name': ''"));

    let id = run(&mut console, r#"create Place name="Cozy_cabin" max_guest=6 latitude=3.5 rooms=many"#);
    let place = console.storage().get(&format!("Place.{id}")).expect("stored");
    assert_eq!(place.get("name"), Some(&json!("Cozy cabin")));
    assert_eq!(place.get("max_guest"), Some(&json!(6)));
    assert_eq!(place.get("latitude"), Some(&json!(3.5)));
    assert!(place.get("rooms").is_none());
}

#[test]
fn quit_blank_and_unknown_lines() {
    let mut console = setup();
    assert_eq!(console.execute_collect("quit").expect("ok").flow, Flow::Quit);
    assert_eq!(console.execute_collect("EOF").expect("ok").flow, Flow::Quit);
    let blank = console.execute_collect("   ").expect("ok");
    assert_eq!(blank.flow, Flow::Continue);
    assert!(blank.lines.is_empty());
    assert!(console.execute_collect("launch rocket").expect("ok").lines.is_empty());
}

#[test]
fn help_lists_commands() {
    let mut console = setup();
    let listing = run(&mut console, "help");
    assert!(listing.contains("create") && listing.contains("update"));
    assert!(run(&mut console, "help show").contains("show <class> <id>"));
    assert_eq!(run(&mut console, "help dance"), "*** No help on dance");
}

#[test]
fn large_integers_stay_numeric() {
    let mut console = setup();
    let id = run(&mut console, "create User");
    run(&mut console, &format!("update User {id} big 12345678901234567890"));
    let user = console.storage().get(&format!("User.{id}")).expect("stored");
    assert_eq!(user.get("big"), Some(&json!(12345678901234567890_u64)));
    assert!(run(&mut console, &format!("show User {id}")).contains("'big': 12345678901234567890"));
}
