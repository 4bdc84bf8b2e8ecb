use std::io::{self, Write};

use colored::Colorize;
use log::{debug, warn};
use msgboard_common::{Response, Status};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, Lines};

use crate::{Client, ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Register,
    List,
    Quit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Register),
            "2" => Some(Self::List),
            "3" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("El campo '{0}' no puede estar vacio")]
    Empty(&'static str),
    #[error("El mensaje supera el maximo de {max} caracteres ({len})")]
    TooLong { len: usize, max: usize },
}

pub fn validate_user(user: &str) -> Result<&str, InputError> {
    let user = user.trim();
    if user.is_empty() {
        return Err(InputError::Empty("usuario"));
    }
    Ok(user)
}

/// Client-side length cap. Counted in characters, not bytes.
pub fn validate_text(text: &str, max_len: usize) -> Result<&str, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InputError::Empty("mensaje"));
    }
    let len = text.chars().count();
    if len > max_len {
        return Err(InputError::TooLong { len, max: max_len });
    }
    Ok(text)
}

pub fn render(response: &Response) -> String {
    let mut out = match response.status {
        Status::Ok => format!("[OK] {}", response.detail).green().to_string(),
        Status::Error => format!("[ERROR] {}", response.detail).red().to_string(),
    };

    if let Some(total) = response.total_count {
        out.push_str(&format!("\nTotal de mensajes: {}", total));
    }

    if let Some(messages) = &response.messages {
        if messages.is_empty() {
            out.push_str(&format!("\n{}", "(sin mensajes)".dimmed()));
        }
        for (i, entry) in messages.iter().enumerate() {
            out.push_str(&format!("\n{:>3}. {}: {}", i + 1, entry.user.bold(), entry.text));
        }
    }

    out
}

const MENU: &str = "\n=== Menu ===\n1) Registrar mensaje\n2) Listar mensajes\n3) Salir";

/// Prompts on `out` and reads answers from the line source.
struct Prompt<'a, R, W> {
    lines: Lines<R>,
    out: &'a mut W,
}

impl<R, W> Prompt<'_, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    // None on end of input.
    async fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        self.lines.next_line().await
    }

    fn say(&mut self, line: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{}", line)
    }
}

/// Runs the interactive loop until the user quits, input runs out, or the
/// connection fails. Invalid server replies are reported and the menu is
/// shown again.
pub async fn run_session<T, R, W>(
    client: Client<T>,
    input: R,
    out: &mut W,
    max_len: usize,
) -> Result<(), ClientError>
where
    T: AsyncRead + AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut client = client;
    let mut prompt = Prompt {
        lines: input.lines(),
        out,
    };

    loop {
        prompt.say(MENU).map_err(local_io)?;
        let Some(choice) = prompt.ask("Seleccione una opcion: ").await.map_err(local_io)? else {
            debug!("Input closed, ending session");
            break;
        };

        let result = match MenuChoice::parse(&choice) {
            Some(MenuChoice::Register) => {
                let Some(user) = prompt.ask("Usuario: ").await.map_err(local_io)? else {
                    break;
                };
                let Some(text) = prompt.ask("Mensaje: ").await.map_err(local_io)? else {
                    break;
                };
                match validate_user(&user).and_then(|u| Ok((u, validate_text(&text, max_len)?))) {
                    Ok((user, text)) => client.register(user, text).await,
                    Err(e) => {
                        prompt.say(e.to_string().yellow()).map_err(local_io)?;
                        continue;
                    }
                }
            }
            Some(MenuChoice::List) => client.list().await,
            Some(MenuChoice::Quit) => {
                let response = client.quit().await?;
                prompt.say(render(&response)).map_err(local_io)?;
                return Ok(());
            }
            None => {
                prompt.say("Opcion invalida".yellow()).map_err(local_io)?;
                continue;
            }
        };

        match result {
            Ok(response) => prompt.say(render(&response)).map_err(local_io)?,
            Err(e) if e.is_recoverable() => {
                warn!("{}", e);
                prompt.say("Respuesta invalida del servidor".red()).map_err(local_io)?;
            }
            Err(e) => return Err(e),
        }
    }

    // Input ran out without an explicit quit; say goodbye anyway.
    let _ = client.quit().await;
    Ok(())
}

fn local_io(e: io::Error) -> ClientError {
    ClientError::Transport(e.into())
}
