use clap::{Parser, Subcommand};
use edutrack_core::session::Role;
use edutrack_core::Importance;
use std::path::PathBuf;

/// Command-line client for the EDU Track school administration API
#[derive(Parser, Debug)]
#[command(name = "edutrack", author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the EDU Track API
    #[arg(long, global = true, env = "EDUTRACK_API_URL")]
    pub api_url: Option<String>,

    /// Path of the session file
    #[arg(long, global = true, env = "EDUTRACK_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "EDUTRACK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show attendance of a section for a course
    Attendance {
        #[arg(long)]
        section_id: String,
        #[arg(long)]
        course_id: String,
    },

    /// Manage announcements
    #[command(subcommand)]
    Announcements(AnnouncementCommand),

    /// List the classes of the logged-in teacher
    Classes,

    /// Inspect or set the stored session
    #[command(subcommand)]
    Session(SessionCommand),

    /// Forget the stored session
    Logout,
}

#[derive(Subcommand, Debug)]
pub enum AnnouncementCommand {
    /// List announcements, optionally for one class
    List {
        /// Class identifier, or "all"
        #[arg(long, default_value = "all")]
        class_id: String,
        /// Only show announcements whose title or content contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Post a new announcement to a course section
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        course_id: i64,
        #[arg(long)]
        section_name: String,
    },

    /// Change an existing announcement; omitted fields keep their current value
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        class_id: Option<String>,
        #[arg(long)]
        importance: Option<Importance>,
    },

    /// Delete an announcement
    Delete {
        #[arg(long)]
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Store an access token obtained from the login flow
    SetToken {
        #[arg(long)]
        token: String,
        #[arg(long)]
        role: Option<Role>,
    },

    /// Show who is logged in
    Show,
}
