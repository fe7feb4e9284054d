use clap::Parser;
use mailbox::cli::{AuthCommand, Cli, Command};

#[test]
fn parses_auth_login_with_token() {
    let cli = Cli::try_parse_from([
        "mailbox",
        "auth",
        "login",
        "--token",
        "abc",
        "--api-url",
        "http://localhost:5000",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::Auth(auth) => match auth.command {
            AuthCommand::Login(login) => {
                assert_eq!(login.token, "abc");
                assert_eq!(login.api_url.as_deref(), Some("http://localhost:5000"));
            }
            _ => panic!("expected login"),
        },
        _ => panic!("expected auth command"),
    }
}

#[test]
fn auth_login_requires_token() {
    assert!(Cli::try_parse_from(["mailbox", "auth", "login"]).is_err());
}

#[test]
fn parses_get_with_view() {
    let cli = Cli::try_parse_from(["mailbox", "get", "abc123", "--view", "sent"])
        .expect("cli parse should work");
    match cli.command {
        Command::Get(get) => {
            assert_eq!(get.id, "abc123");
            assert_eq!(get.view, "sent");
        }
        _ => panic!("expected get command"),
    }
}

#[test]
fn parses_send() {
    let cli = Cli::try_parse_from([
        "mailbox",
        "send",
        "--to",
        "dev@example.com,ops@example.com",
        "--subject",
        "hi",
        "--body",
        "hello",
        "--attach",
        "a.txt",
        "--attach",
        "b.txt",
        "--inline",
        "logo.png",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::Send(send) => {
            assert_eq!(send.to, ["dev@example.com", "ops@example.com"]);
            assert_eq!(send.subject.as_deref(), Some("hi"));
            assert_eq!(send.body.as_deref(), Some("hello"));
            assert_eq!(send.attach.len(), 2);
            assert_eq!(send.inline.len(), 1);
        }
        _ => panic!("expected send command"),
    }
}

#[test]
fn parses_list() {
    let cli = Cli::try_parse_from([
        "mailbox", "list", "--view", "trash", "--limit", "3", "--pages", "2",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::List(list) => {
            assert_eq!(list.view, "trash");
            assert_eq!(list.limit, Some(3));
            assert_eq!(list.pages, 2);
            assert_eq!(list.q, None);
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn parses_bulk_trash_and_purge() {
    let cli = Cli::try_parse_from(["mailbox", "trash", "m1", "m2"]).expect("trash");
    match cli.command {
        Command::Trash(trash) => {
            assert_eq!(trash.ids, ["m1", "m2"]);
            assert_eq!(trash.view, "inbox");
        }
        _ => panic!("expected trash command"),
    }

    let cli = Cli::try_parse_from(["mailbox", "purge", "t1", "--yes"]).expect("purge");
    match cli.command {
        Command::Purge(purge) => assert!(purge.yes),
        _ => panic!("expected purge command"),
    }

    let cli = Cli::try_parse_from(["mailbox", "empty-trash"]).expect("empty-trash");
    match cli.command {
        Command::EmptyTrash(confirm) => assert!(!confirm.yes),
        _ => panic!("expected empty-trash command"),
    }
}

#[test]
fn parses_generate_with_default_tone() {
    let cli = Cli::try_parse_from(["mailbox", "--json", "generate", "say thanks"])
        .expect("cli parse should work");
    assert!(cli.json);
    match cli.command {
        Command::Generate(generate) => {
            assert_eq!(generate.instruction, "say thanks");
            assert_eq!(generate.tone, "professional");
        }
        _ => panic!("expected generate command"),
    }
}
