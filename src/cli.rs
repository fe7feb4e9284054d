use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mailbox", version, about = "Mailbox client for the web mail backend")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Auth(AuthArgs),
    List(ListArgs),
    Get(GetArgs),
    Star(TargetArgs),
    Unstar(TargetArgs),
    Read(TargetArgs),
    Unread(TargetArgs),
    /// Move one or more messages to trash
    Trash(BulkArgs),
    /// Restore a message from trash
    Restore(IdArgs),
    /// Permanently delete messages from trash
    Purge(PurgeArgs),
    /// Permanently delete everything in trash
    EmptyTrash(ConfirmArgs),
    Summarize(IdArgs),
    /// Save an attachment of a message to disk
    Attachment(AttachmentArgs),
    Send(ComposeArgs),
    Draft(ComposeArgs),
    Reply(ReplyArgs),
    Forward(ForwardArgs),
    /// Generate an email body from an instruction
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    Login(LoginArgs),
    Status,
    Logout,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, help = "Bearer token issued by the web login")]
    pub token: String,
    #[arg(long, help = "Account address shown in status output")]
    pub email: Option<String>,
    #[arg(long, help = "Backend base url to store in the profile")]
    pub api_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value = "inbox", help = "inbox, sent, drafts, trash or starred")]
    pub view: String,
    #[arg(long, help = "Search query; overrides --view")]
    pub q: Option<String>,
    #[arg(long, help = "Messages per page (defaults to the profile page size)")]
    pub limit: Option<u32>,
    #[arg(long, default_value_t = 1, help = "Number of pages to fetch")]
    pub pages: u32,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[arg(help = "Message id")]
    pub id: String,
    #[arg(long, default_value = "inbox", help = "View the message is listed in")]
    pub view: String,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Message id")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    #[arg(help = "Message id")]
    pub id: String,
    #[arg(long, default_value = "inbox", help = "View the message is listed in")]
    pub view: String,
}

#[derive(Debug, Args)]
pub struct BulkArgs {
    #[arg(required = true, num_args = 1.., help = "Message ids")]
    pub ids: Vec<String>,
    #[arg(long, default_value = "inbox", help = "View the messages are listed in")]
    pub view: String,
}

#[derive(Debug, Args)]
pub struct ConfirmArgs {
    #[arg(long, help = "Confirm the irreversible delete")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct PurgeArgs {
    #[arg(required = true, num_args = 1.., help = "Message ids in trash")]
    pub ids: Vec<String>,
    #[arg(long, help = "Confirm the irreversible delete")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct AttachmentArgs {
    #[arg(help = "Message id")]
    pub message_id: String,
    #[arg(help = "Attachment id")]
    pub attachment_id: String,
    #[arg(long, short = 'o', help = "Output file")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ComposeArgs {
    #[arg(long, value_delimiter = ',', num_args = 1.., help = "Recipient addresses")]
    pub to: Vec<String>,
    #[arg(long, value_delimiter = ',', num_args = 1.., help = "CC addresses")]
    pub cc: Vec<String>,
    #[arg(long, value_delimiter = ',', num_args = 1.., help = "BCC addresses")]
    pub bcc: Vec<String>,
    #[arg(long, visible_alias = "subj", help = "Email subject")]
    pub subject: Option<String>,
    #[arg(long, help = "Inline markdown body")]
    pub body: Option<String>,
    #[arg(long, help = "Read markdown body from file")]
    pub body_file: Option<PathBuf>,
    #[arg(long, help = "Read markdown body from stdin")]
    pub stdin: bool,
    #[arg(long, action = ArgAction::Append, help = "Attach file (repeatable)")]
    pub attach: Vec<PathBuf>,
    #[arg(long, action = ArgAction::Append, help = "Embed image in the body (repeatable)")]
    pub inline: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReplyArgs {
    #[arg(help = "Message id")]
    pub id: String,
    #[arg(long, help = "Reply body")]
    pub body: String,
}

#[derive(Debug, Args)]
pub struct ForwardArgs {
    #[arg(help = "Message id")]
    pub id: String,
    #[arg(long, help = "Recipient address")]
    pub to: String,
    #[arg(long, help = "Message added above the forwarded content")]
    pub body: String,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(help = "What the email should say")]
    pub instruction: String,
    #[arg(
        long,
        default_value = "professional",
        help = "professional, friendly, formal, casual or urgent"
    )]
    pub tone: String,
}
