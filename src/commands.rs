/// Built-in meta-commands.
///
/// An immutable catalog, built once at startup, maps a typed shorthand
/// (`\d`, `\dt`, `\dv`, `\d schema.table`) to a fixed SQL template. A
/// trigger matches the first whitespace-delimited token of the line; when a
/// variant carries a parameter pattern, the remainder of the line must match
/// it and the captured groups are substituted into the template at `$n`
/// placeholders. Lines that match no variant fall through as ordinary SQL.
use once_cell::sync::Lazy;
use regex::Regex;

/// One resolvable shape of a built-in command.
struct Variant {
    param: Option<Regex>,
    template: &'static str,
}

struct Builtin {
    trigger: &'static str,
    variants: Vec<Variant>,
}

const LIST_ALL_SQL: &str = "\
SELECT 'main' AS [schema], [name] AS [name], [type] AS [type]
FROM [sqlite_master]
WHERE [type] IN ('table', 'view')
ORDER BY [name];";

const LIST_TABLES_SQL: &str = "\
SELECT 'main' AS [schema], [name] AS [name], [type] AS [type]
FROM [sqlite_master]
WHERE [type] = 'table'
ORDER BY [name];";

const LIST_VIEWS_SQL: &str = "\
SELECT 'main' AS [schema], [name] AS [name], [type] AS [type]
FROM [sqlite_master]
WHERE [type] = 'view'
ORDER BY [name];";

const DESCRIBE_SQL: &str = "\
SELECT [name] AS [column], [type] AS [type],
       CASE WHEN [notnull] = 1 THEN 'not null' ELSE '' END AS [modifiers]
FROM pragma_table_info('$2', '$1')
ORDER BY [cid] ASC;";

// Unqualified names describe against the main schema.
const DESCRIBE_UNQUALIFIED_SQL: &str = "\
SELECT [name] AS [column], [type] AS [type],
       CASE WHEN [notnull] = 1 THEN 'not null' ELSE '' END AS [modifiers]
FROM pragma_table_info('$1', 'main')
ORDER BY [cid] ASC;";

static BUILTINS: Lazy<Vec<Builtin>> = Lazy::new(|| {
    vec![
        Builtin {
            trigger: "\\d",
            variants: vec![
                Variant {
                    param: None,
                    template: LIST_ALL_SQL,
                },
                Variant {
                    param: Some(
                        Regex::new(r"^\[*([^.\]\[]+)\]*\.\[*([^.\]\[]+)\]*$").unwrap(),
                    ),
                    template: DESCRIBE_SQL,
                },
                Variant {
                    param: Some(Regex::new(r"^\[*([^.\]\[]+)\]*$").unwrap()),
                    template: DESCRIBE_UNQUALIFIED_SQL,
                },
            ],
        },
        Builtin {
            trigger: "\\dt",
            variants: vec![Variant {
                param: None,
                template: LIST_TABLES_SQL,
            }],
        },
        Builtin {
            trigger: "\\dv",
            variants: vec![Variant {
                param: None,
                template: LIST_VIEWS_SQL,
            }],
        },
    ]
});

/// Resolves a typed line against the catalog, returning the substituted SQL.
/// `None` means "not a built-in command" — including a known trigger whose
/// parameter text matches no pattern.
pub fn resolve(line: &str) -> Option<String> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let trigger = parts.next()?;
    let param = parts.next().map(str::trim).filter(|p| !p.is_empty());
    let builtin = BUILTINS.iter().find(|b| b.trigger == trigger)?;

    for variant in &builtin.variants {
        match (&variant.param, param) {
            (None, None) => return Some(variant.template.to_string()),
            (None, Some(_)) | (Some(_), None) => continue,
            (Some(pattern), Some(text)) => {
                if let Some(caps) = pattern.captures(text) {
                    let mut sql = variant.template.to_string();
                    for i in (1..caps.len()).rev() {
                        if let Some(group) = caps.get(i) {
                            sql = sql.replace(&format!("${}", i), group.as_str());
                        }
                    }
                    return Some(sql);
                }
            }
        }
    }
    None
}

/// Commands handled by the session itself rather than expanded to SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticCommand {
    Help,
    Quit,
    UpdateSuggestions,
}

pub fn static_command(line: &str) -> Option<StaticCommand> {
    match line {
        "help" => Some(StaticCommand::Help),
        "\\q" => Some(StaticCommand::Quit),
        "\\u" => Some(StaticCommand::UpdateSuggestions),
        _ => None,
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  \\d       \tLists tables and views
  \\dt      \tLists tables
  \\dv      \tLists views
  \\d TABLE \tDescribes table schema
  \\q       \tQuit
Other commands:
  \\u       \tUpdates available suggestions";
