//! Slash command registry for REPL and TUI command discovery.
//!
//! Provides structured metadata for all `/command` slash commands,
//! enabling categorized help, alias resolution, and tab completion.

/// Categories for grouping commands in `/help` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    Session,
    Agent,
    Safety,
    Development,
    System,
    Ui,
}

impl CommandCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CommandCategory::Session => "Session",
            CommandCategory::Agent => "Agent",
            CommandCategory::Safety => "Safety",
            CommandCategory::Development => "Development",
            CommandCategory::System => "System",
            CommandCategory::Ui => "UI",
        }
    }

    pub fn all() -> &'static [CommandCategory] {
        &[
            CommandCategory::Session,
            CommandCategory::Agent,
            CommandCategory::Safety,
            CommandCategory::Development,
            CommandCategory::System,
            CommandCategory::Ui,
        ]
    }
}

impl std::fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Metadata describing a slash command.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    /// Primary name including the slash, e.g., "/compact".
    pub name: &'static str,
    /// Alternative aliases, e.g., &["/exit", "/q"] for /quit.
    pub aliases: &'static [&'static str],
    /// One-line description shown in /help.
    pub description: &'static str,
    /// Usage pattern, e.g., "/config [key] [value]".
    pub usage: &'static str,
    /// Category for grouping in /help.
    pub category: CommandCategory,
    /// Whether this command is only available in TUI mode.
    pub tui_only: bool,
    /// Detailed help text shown by `/help <command>`. Includes examples and explanation.
    pub detailed_help: Option<&'static str>,
}

/// Registry holding all slash commands with their metadata.
pub struct CommandRegistry {
    commands: Vec<CommandInfo>,
}

#[allow(dead_code)]
impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Create a registry pre-populated with all default commands.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register a single command.
    pub fn register(&mut self, info: CommandInfo) {
        self.commands.push(info);
    }

    /// Register all built-in commands.
    pub fn register_defaults(&mut self) {
        // Session commands
        self.register(CommandInfo {
            name: "/quit",
            aliases: &["/exit", "/q"],
            description: "Exit Rustant",
            usage: "/quit",
            category: CommandCategory::Session,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/clear",
            aliases: &[],
            description: "Clear the screen",
            usage: "/clear",
            category: CommandCategory::Session,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/session",
            aliases: &[],
            description: "Save, load, or list sessions",
            usage: "/session save|load|list [name]",
            category: CommandCategory::Session,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/resume",
            aliases: &[],
            description: "Resume a saved session (latest if no name)",
            usage: "/resume [name]",
            category: CommandCategory::Session,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/sessions",
            aliases: &[],
            description: "List, search, tag, or filter saved sessions",
            usage: "/sessions [search <q> | tag <name> <tag> | filter <tag>]",
            category: CommandCategory::Session,
            tui_only: false,
            detailed_help: Some("Manage saved sessions.\n\nSubcommands:\n  /sessions              - List recent sessions\n  /sessions search <q>   - Search sessions by name, goal, or summary\n  /sessions tag <n> <t>  - Add a tag to a session\n  /sessions filter <tag> - List sessions with a specific tag\n\nExamples:\n  /sessions search auth  - Find sessions related to auth\n  /sessions tag my-proj bugfix - Tag session 'my-proj' with 'bugfix'\n  /sessions filter refactor    - List all refactoring sessions"),
        });

        // Agent commands
        self.register(CommandInfo {
            name: "/cost",
            aliases: &[],
            description: "Show token usage and cost",
            usage: "/cost",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/tools",
            aliases: &[],
            description: "List available tools",
            usage: "/tools",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/status",
            aliases: &[],
            description: "Show agent status, task, and iteration count",
            usage: "/status",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/compact",
            aliases: &[],
            description: "Compress conversation context to free memory",
            usage: "/compact",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/context",
            aliases: &[],
            description: "Show context window usage breakdown",
            usage: "/context",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/memory",
            aliases: &[],
            description: "Show memory system stats",
            usage: "/memory",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/pin",
            aliases: &[],
            description: "Pin message #n (survives compression) or list pinned",
            usage: "/pin [n]",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/unpin",
            aliases: &[],
            description: "Unpin message #n",
            usage: "/unpin <n>",
            category: CommandCategory::Agent,
            tui_only: false,
            detailed_help: None,
        });

        // Safety commands
        self.register(CommandInfo {
            name: "/safety",
            aliases: &[],
            description: "Show current safety mode and stats",
            usage: "/safety",
            category: CommandCategory::Safety,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/permissions",
            aliases: &[],
            description: "View or set approval mode (safe/cautious/paranoid/yolo)",
            usage: "/permissions [mode]",
            category: CommandCategory::Safety,
            tui_only: false,
            detailed_help: Some("Control how the agent asks for permission before executing actions.\n\nModes:\n  safe     - Auto-approve read-only operations, ask for writes/executes (default)\n  cautious - Auto-approve reads and reversible writes, ask for executes\n  paranoid - Ask for approval on every single action\n  yolo     - Auto-approve everything (use with caution!)\n\nExamples:\n  /permissions          - Show current mode\n  /permissions cautious - Switch to cautious mode"),
        });
        self.register(CommandInfo {
            name: "/audit",
            aliases: &[],
            description: "Show, query, export, or verify audit trail",
            usage: "/audit [show [n] | verify | export [fmt] | query <tool>]",
            category: CommandCategory::Safety,
            tui_only: false,
            detailed_help: None,
        });

        // Development commands
        self.register(CommandInfo {
            name: "/undo",
            aliases: &[],
            description: "Undo last file operation via git checkpoint",
            usage: "/undo",
            category: CommandCategory::Development,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/diff",
            aliases: &[],
            description: "Show recent file changes",
            usage: "/diff",
            category: CommandCategory::Development,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/review",
            aliases: &[],
            description: "Review all session file changes",
            usage: "/review",
            category: CommandCategory::Development,
            tui_only: false,
            detailed_help: None,
        });

        // System commands
        self.register(CommandInfo {
            name: "/help",
            aliases: &["/?"],
            description: "Show help (use /help <topic> for details)",
            usage: "/help [topic]",
            category: CommandCategory::System,
            tui_only: false,
            detailed_help: Some("Show all commands or detailed help for a specific topic.\n\nExamples:\n  /help           - Show all available commands\n  /help safety    - Show safety-related commands and explanation\n  /help session   - Show session management commands\n  /help compact   - Show help for /compact command\n\nTopics match command names (without /) or category names."),
        });
        self.register(CommandInfo {
            name: "/config",
            aliases: &[],
            description: "View or modify runtime configuration",
            usage: "/config [key] [value]",
            category: CommandCategory::System,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/doctor",
            aliases: &[],
            description: "Run diagnostic checks (LLM, tools, workspace)",
            usage: "/doctor",
            category: CommandCategory::System,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/setup",
            aliases: &[],
            description: "Re-run provider setup wizard",
            usage: "/setup",
            category: CommandCategory::System,
            tui_only: false,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/workflows",
            aliases: &[],
            description: "List available workflow templates",
            usage: "/workflows",
            category: CommandCategory::System,
            tui_only: false,
            detailed_help: None,
        });

        // Trust command
        self.register(CommandInfo {
            name: "/trust",
            aliases: &[],
            description: "Show safety trust dashboard with per-tool approval stats",
            usage: "/trust",
            category: CommandCategory::Safety,
            tui_only: false,
            detailed_help: Some("Display a trust calibration dashboard showing:\n  - Current approval mode with plain-English explanation\n  - Per-tool approval/denial statistics from the audit log\n  - Suggestions for adjusting trust based on your usage patterns\n\nThe dashboard helps you understand why you are being prompted and\nmake informed decisions about adjusting your approval mode."),
        });

        // Keys command
        self.register(CommandInfo {
            name: "/keys",
            aliases: &[],
            description: "Show keyboard shortcuts (TUI: F1 for overlay)",
            usage: "/keys",
            category: CommandCategory::System,
            tui_only: false,
            detailed_help: Some("Show all keyboard shortcuts grouped by context.\n\nIn TUI mode, press F1 for a floating overlay.\n\nGlobal:    Ctrl+C/D quit, Ctrl+L scroll to bottom\nOverlays:  Ctrl+E explanation panel, Ctrl+T task board\nApproval:  y=approve, n=deny, a=approve all, d=diff, ?=help\nVim mode:  i/a=insert, Esc=normal, /=search, q=quit"),
        });

        // TUI-only commands
        self.register(CommandInfo {
            name: "/theme",
            aliases: &[],
            description: "Switch color theme",
            usage: "/theme dark|light",
            category: CommandCategory::Ui,
            tui_only: true,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/sidebar",
            aliases: &[],
            description: "Toggle sidebar visibility",
            usage: "/sidebar",
            category: CommandCategory::Ui,
            tui_only: true,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/vim",
            aliases: &[],
            description: "Toggle vim mode",
            usage: "/vim",
            category: CommandCategory::Ui,
            tui_only: true,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/save",
            aliases: &[],
            description: "Save session (shorthand for /session save)",
            usage: "/save <name>",
            category: CommandCategory::Session,
            tui_only: true,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/load",
            aliases: &[],
            description: "Load session (shorthand for /session load)",
            usage: "/load <name>",
            category: CommandCategory::Session,
            tui_only: true,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/analytics",
            aliases: &[],
            description: "Show session analytics dashboard",
            usage: "/analytics",
            category: CommandCategory::Agent,
            tui_only: true,
            detailed_help: None,
        });
        self.register(CommandInfo {
            name: "/replay",
            aliases: &[],
            description: "Replay execution traces",
            usage: "/replay [next|prev|timeline|reset]",
            category: CommandCategory::Agent,
            tui_only: true,
            detailed_help: None,
        });
    }

    /// Look up a command by name or alias.
    pub fn lookup(&self, input: &str) -> Option<&CommandInfo> {
        self.commands
            .iter()
            .find(|cmd| cmd.name == input || cmd.aliases.contains(&input))
    }

    /// Generate categorized help text.
    pub fn help_text(&self) -> String {
        let mut output = String::from("\nAvailable commands:\n");

        for category in CommandCategory::all() {
            let cmds: Vec<&CommandInfo> = self
                .commands
                .iter()
                .filter(|c| c.category == *category)
                .collect();

            if cmds.is_empty() {
                continue;
            }

            output.push_str(&format!("\n  {}:\n", category.label()));

            for cmd in cmds {
                let aliases = if cmd.aliases.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", cmd.aliases.join(", "))
                };
                let tui_marker = if cmd.tui_only { " (TUI)" } else { "" };
                output.push_str(&format!(
                    "    {:<24} {}{}{}\n",
                    cmd.usage, cmd.description, aliases, tui_marker
                ));
            }
        }

        output.push_str("\nInput:\n  Type your task or question and press Enter.\n");
        output
    }

    /// Return command name completions matching a prefix.
    pub fn completions(&self, prefix: &str) -> Vec<&str> {
        let mut results = Vec::new();
        for cmd in &self.commands {
            if cmd.name.starts_with(prefix) {
                results.push(cmd.name);
            }
            for alias in cmd.aliases {
                if alias.starts_with(prefix) {
                    results.push(alias);
                }
            }
        }
        results.sort();
        results
    }

    /// Return all registered commands.
    pub fn all(&self) -> &[CommandInfo] {
        &self.commands
    }

    /// Return the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the registry is empty.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Get detailed help for a specific topic (command name or category).
    ///
    /// Looks up by command name (with or without `/` prefix), alias, or category label.
    /// Returns formatted help text or None if the topic is not found.
    pub fn help_for(&self, topic: &str) -> Option<String> {
        let topic_lower = topic.to_lowercase();
        let topic_with_slash = if topic_lower.starts_with('/') {
            topic_lower.clone()
        } else {
            format!("/{}", topic_lower)
        };

        // Try exact command lookup
        if let Some(cmd) = self.lookup(&topic_with_slash) {
            let mut output = format!("{} - {}\n", cmd.name, cmd.description);
            output.push_str(&format!("Usage: {}\n", cmd.usage));
            if !cmd.aliases.is_empty() {
                output.push_str(&format!("Aliases: {}\n", cmd.aliases.join(", ")));
            }
            if cmd.tui_only {
                output.push_str("Note: This command is only available in TUI mode.\n");
            }
            if let Some(detailed) = cmd.detailed_help {
                output.push('\n');
                output.push_str(detailed);
                output.push('\n');
            }
            return Some(output);
        }

        // Try category match
        for cat in CommandCategory::all() {
            if cat.label().to_lowercase() == topic_lower {
                let cmds: Vec<&CommandInfo> = self
                    .commands
                    .iter()
                    .filter(|c| c.category == *cat)
                    .collect();
                if cmds.is_empty() {
                    return None;
                }
                let mut output = format!("{} Commands:\n\n", cat.label());
                for cmd in cmds {
                    let tui_marker = if cmd.tui_only { " (TUI)" } else { "" };
                    output.push_str(&format!(
                        "  {:<24} {}{}\n",
                        cmd.usage, cmd.description, tui_marker
                    ));
                }
                return Some(output);
            }
        }

        None
    }

    /// Suggest the closest command for an unknown input using edit distance.
    pub fn suggest(&self, input: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;

        for cmd in &self.commands {
            let dist = edit_distance(input, cmd.name);
            if dist <= 3 && (best.is_none() || dist < best.unwrap().1) {
                best = Some((cmd.name, dist));
            }
            for alias in cmd.aliases {
                let dist = edit_distance(input, alias);
                if dist <= 3 && (best.is_none() || dist < best.unwrap().1) {
                    best = Some((alias, dist));
                }
            }
        }

        best.map(|(name, _)| name)
    }
}

/// Simple Levenshtein edit distance for command suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    let a_len = a_bytes.len();
    let b_len = b_bytes.len();

    let mut prev = (0..=b_len).collect::<Vec<_>>();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = if a_bytes[i - 1] == b_bytes[j - 1] {
                0
            } else {
                1
            };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}
