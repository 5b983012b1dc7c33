//! Internationalization (i18n) module.
//!
//! Provides localized strings for CLI help, CLI output and the default
//! message subject. English is the default language; Spanish is available
//! as an alternative.

use std::sync::OnceLock;

static CURRENT_LANG: OnceLock<Lang> = OnceLock::new();

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// English (default)
    En,
    /// Spanish
    Es,
}

impl Lang {
    /// Parse a language code string (e.g. "en", "es", "en_US", "es_ES").
    /// Returns `None` for unrecognized codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.to_lowercase();
        let prefix = normalized.split(['_', '-', '.']).next().unwrap_or("");
        match prefix {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Initialize the global language. Call once at startup.
/// If already initialized, this is a no-op.
pub fn set_lang(lang: Lang) {
    let _ = CURRENT_LANG.set(lang);
}

/// Get the currently configured language (defaults to English).
pub fn lang() -> Lang {
    CURRENT_LANG.get().copied().unwrap_or(Lang::En)
}

/// Detect language from `FILEMAILER_LANG`, `LC_MESSAGES`, then `LANG`.
pub fn detect_system_lang() -> Lang {
    std::env::var("FILEMAILER_LANG")
        .ok()
        .and_then(|v| Lang::from_code(&v))
        .or_else(|| {
            std::env::var("LC_MESSAGES")
                .ok()
                .and_then(|v| Lang::from_code(&v))
        })
        .or_else(|| std::env::var("LANG").ok().and_then(|v| Lang::from_code(&v)))
        .unwrap_or(Lang::En)
}

/// Macro for defining translatable message functions.
/// Each function returns a `&'static str` based on the current language.
macro_rules! msg {
    ($name:ident, $en:expr, $es:expr) => {
        /// Returns a localized string for the current language.
        pub fn $name() -> &'static str {
            match lang() {
                Lang::En => $en,
                Lang::Es => $es,
            }
        }
    };
}

// ── General ──────────────────────────────────────────────────────

msg!(
    app_about,
    "filemailer \u{2014} Bundle a directory of files into a ZIP archive and mail it.",
    "filemailer \u{2014} Empaqueta los ficheros de un directorio en un ZIP y los env\u{ed}a por correo."
);
msg!(
    app_long_about,
    "filemailer \u{2014} Bundle the files of a directory that match an extension\ninto a single ZIP archive, render a message body from a template\nand send it with the archive attached.",
    "filemailer \u{2014} Empaqueta los ficheros de un directorio que coinciden con una extensi\u{f3}n\nen un \u{fa}nico archivo ZIP, genera el cuerpo del mensaje a partir de una plantilla\ny lo env\u{ed}a con el archivo adjunto."
);
msg!(
    app_after_help,
    "Configuration: $FILEMAILER_CONFIG or <config dir>/filemailer/config.toml",
    "Configuraci\u{f3}n: $FILEMAILER_CONFIG o <dir. de configuraci\u{f3}n>/filemailer/config.toml"
);

// ── Mail ─────────────────────────────────────────────────────────

msg!(mail_subject, "Backup delivery", "Env\u{ed}o de backup");

// ── CLI help strings ─────────────────────────────────────────────

msg!(
    help_cmd_send,
    "Build the archive and mail it to a recipient",
    "Construir el archivo y enviarlo por correo a un destinatario"
);
msg!(
    help_cmd_build,
    "Build the archive without sending it",
    "Construir el archivo sin enviarlo"
);
msg!(
    help_cmd_inspect,
    "List the entries of an archive",
    "Listar las entradas de un archivo"
);
msg!(
    help_cmd_render,
    "Print the rendered message body",
    "Mostrar el cuerpo del mensaje generado"
);
msg!(
    help_cmd_encode,
    "Encode text as base64",
    "Codificar texto en base64"
);
msg!(
    help_cmd_decode,
    "Decode base64 text",
    "Decodificar texto base64"
);
msg!(
    help_cmd_config,
    "Show the effective configuration",
    "Mostrar la configuraci\u{f3}n efectiva"
);
msg!(
    help_cmd_completions,
    "Generate shell completions",
    "Generar completions para tu shell"
);
msg!(
    help_cmd_manpage,
    "Generate a man page",
    "Generar p\u{e1}gina de manual"
);

// ── CLI output ───────────────────────────────────────────────────

msg!(msg_archiving, "Archiving", "Archivando");
msg!(msg_archive, "Archive", "Archivo");
msg!(msg_entries, "Entries", "Entradas");
msg!(msg_input_size, "Input size", "Tama\u{f1}o de entrada");
msg!(msg_archive_size, "Archive size", "Tama\u{f1}o del archivo");
msg!(msg_elapsed, "Elapsed", "Tiempo");
msg!(msg_recipient, "Recipient", "Destinatario");
msg!(msg_sent, "Message sent", "Mensaje enviado");
msg!(msg_failed_stage, "Failed at stage", "Fallo en la etapa");
msg!(
    msg_no_files,
    "No matching files; the archive is empty.",
    "No hay ficheros coincidentes; el archivo est\u{e1} vac\u{ed}o."
);
msg!(msg_config_written, "Configuration written to", "Configuraci\u{f3}n guardada en");

// ── Errors ───────────────────────────────────────────────────────

msg!(
    err_file_not_found,
    "File not found",
    "Fichero no encontrado"
);
msg!(
    err_dispatch_failed,
    "Dispatch failed",
    "El env\u{ed}o ha fallado"
);
