//! Line based console on stdin, standing in for the game's command system. Players joined from here get a
//! connection that only logs what would have been sent to them.

use std::sync::Arc;

use masquerade_shared::{debug, error, info, warn};
use rustc_hash::FxHashMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::{
    data::{OwnerId, PacketFrame, ProfileId},
    identity::{ClientConnection, DeliveryError},
    managers::{CharacterError, SwitchOutcome},
    server::{ServerGone, ServerHandle},
};

const HELP: &str = "commands:
  join <player> [uuid]              connect a player
  leave <player>                    disconnect a player
  move <player> <world> <x> <z>     move a player
  create <player> [name]            create a profile, generates a name if none is given
  rename <player> <profile> <name>  rename a profile
  set-skin <player> <profile> [ref] resolve the skin from a player name or uuid, no ref to clear
  delete <player> <profile>         delete a profile
  list <player>                     list profiles
  switch <player> <profile>         switch to a profile
  reset <player>                    switch back to the original identity
  status                            show server status
  stop                              save and shut down
<profile> is a number from `list`, a profile id, or a profile name";

/// Connection of a console player, logs every frame instead of sending it.
struct LoggingConnection {
    name: String,
}

impl ClientConnection for LoggingConnection {
    fn send_frames(&self, frames: &[PacketFrame]) -> Result<(), DeliveryError> {
        for frame in frames {
            match frame.split() {
                Ok((id, body)) => debug!("-> {}: packet 0x{id:02x}, {} bytes", self.name, body.len()),
                Err(err) => warn!("-> {}: malformed frame: {err}", self.name),
            }
        }

        Ok(())
    }
}

enum ConsoleError {
    Usage(&'static str),
    UnknownPlayer(String),
    UnknownProfile(String),
    Character(CharacterError),
}

impl From<CharacterError> for ConsoleError {
    fn from(value: CharacterError) -> Self {
        Self::Character(value)
    }
}

type ConsoleResult = Result<Result<(), ConsoleError>, ServerGone>;

pub struct Console {
    handle: ServerHandle,
    players: FxHashMap<String, OwnerId>, // lowercase name : owner
}

impl Console {
    pub fn new(handle: ServerHandle) -> Self {
        Self {
            handle,
            players: FxHashMap::default(),
        }
    }

    /// Read commands until stdin closes or `stop` is entered. Returns `true` if the server should stop.
    pub async fn run(mut self) -> bool {
        info!("Console ready, type `help` for a list of commands");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return false,
                Err(err) => {
                    error!("failed to read from stdin: {err}");
                    return false;
                }
            };

            let args: Vec<&str> = line.split_whitespace().collect();
            let Some((&command, args)) = args.split_first() else {
                continue;
            };

            if command == "stop" {
                return true;
            }

            match self.execute(command, args).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => self.report(err),
                Err(ServerGone) => {
                    error!("the server is gone, closing the console");
                    return false;
                }
            }
        }
    }

    fn report(&self, err: ConsoleError) {
        match err {
            ConsoleError::Usage(usage) => warn!("usage: {usage}"),
            ConsoleError::UnknownPlayer(name) => warn!("{name} is not online"),
            ConsoleError::UnknownProfile(profile) => warn!("no profile matches \"{profile}\""),
            ConsoleError::Character(err) => warn!("{err}"),
        }
    }

    fn owner(&self, name: Option<&&str>) -> Result<OwnerId, ConsoleError> {
        let name = name.ok_or(ConsoleError::Usage("<command> <player> ..."))?;
        self.players
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| ConsoleError::UnknownPlayer((*name).to_owned()))
    }

    /// Find a profile by its position in `list`, its id, or its name.
    async fn profile(&self, owner: OwnerId, query: Option<&&str>) -> Result<Result<ProfileId, ConsoleError>, ServerGone> {
        let Some(query) = query else {
            return Ok(Err(ConsoleError::Usage("<command> <player> <profile> ...")));
        };

        let listing = match self.handle.list(owner).await? {
            Ok(listing) => listing,
            Err(err) => return Ok(Err(err.into())),
        };

        let found = if let Ok(index) = query.parse::<usize>() {
            index.checked_sub(1).and_then(|i| listing.profiles.get(i))
        } else if let Ok(id) = Uuid::try_parse(query) {
            listing.profiles.iter().find(|p| p.profile_id == id)
        } else {
            let name = query.replace('_', " ");
            listing.profiles.iter().find(|p| p.display_name.eq_ignore_ascii_case(&name))
        };

        Ok(found.map(|p| p.profile_id).ok_or_else(|| ConsoleError::UnknownProfile((*query).to_owned())))
    }

    async fn execute(&mut self, command: &str, args: &[&str]) -> ConsoleResult {
        macro_rules! tri {
            ($e:expr) => {
                match $e {
                    Ok(x) => x,
                    Err(err) => return Ok(Err(err.into())),
                }
            };
        }

        match command {
            "help" => info!("{HELP}"),

            "join" => {
                let Some(&name) = args.first() else {
                    return Ok(Err(ConsoleError::Usage("join <player> [uuid]")));
                };

                let uuid = args.get(1).and_then(|u| Uuid::try_parse(u).ok());
                let connection = Arc::new(LoggingConnection { name: name.to_owned() });

                let owner = tri!(self.handle.join(name, uuid, None, connection).await?);
                self.players.insert(name.to_lowercase(), owner);
            }

            "leave" => {
                let owner = tri!(self.owner(args.first()));
                tri!(self.handle.leave(owner).await?);
                self.players.retain(|_, o| *o != owner);
            }

            "move" => {
                let owner = tri!(self.owner(args.first()));
                let x = args.get(2).map(|x| x.parse::<f64>());
                let z = args.get(3).map(|z| z.parse::<f64>());
                let (Some(world), Some(Ok(x)), Some(Ok(z))) = (args.get(1), x, z) else {
                    return Ok(Err(ConsoleError::Usage("move <player> <world> <x> <z>")));
                };

                tri!(self.handle.move_player(owner, world, x, z).await?);
            }

            "create" => {
                let owner = tri!(self.owner(args.first()));
                let name = (args.len() > 1).then(|| args[1..].join(" "));

                let profile = tri!(self.handle.create(owner, name).await?);
                info!("created profile {} ({})", profile.display_name, profile.profile_id);
            }

            "rename" => {
                let owner = tri!(self.owner(args.first()));
                let profile_id = tri!(self.profile(owner, args.get(1)).await?);
                if args.len() < 3 {
                    return Ok(Err(ConsoleError::Usage("rename <player> <profile> <name>")));
                }

                tri!(self.handle.rename(owner, profile_id, &args[2..].join(" ")).await?);
                info!("profile renamed");
            }

            "set-skin" => {
                let owner = tri!(self.owner(args.first()));
                let profile_id = tri!(self.profile(owner, args.get(1)).await?);
                let reference = args.get(2).map(|r| (*r).to_owned());

                tri!(self.handle.set_skin(owner, profile_id, reference).await?);
                info!("skin updated");
            }

            "delete" => {
                let owner = tri!(self.owner(args.first()));
                let profile_id = tri!(self.profile(owner, args.get(1)).await?);

                match tri!(self.handle.delete(owner, profile_id).await?) {
                    Some(report) => info!("profile deleted, original identity sent to {} observers", report.delivered),
                    None => info!("profile deleted"),
                }
            }

            "list" => {
                let owner = tri!(self.owner(args.first()));
                let listing = tri!(self.handle.list(owner).await?);

                if listing.profiles.is_empty() {
                    info!("no profiles ({})", listing.context);
                }

                for (i, profile) in listing.profiles.iter().enumerate() {
                    let marker = if listing.active == Some(profile.profile_id) { "*" } else { " " };
                    let skin = match (&profile.skin_reference, &profile.texture) {
                        (_, Some(texture)) => texture.skin_url().unwrap_or_else(|| "custom skin".to_owned()),
                        (Some(reference), None) => format!("skin of {reference} (unresolved)"),
                        (None, None) => "default skin".to_owned(),
                    };

                    info!("{marker}{}. {} - {skin} [{}]", i + 1, profile.display_name, profile.profile_id);
                }

                if !listing.context.is_default() {
                    info!("context: {}", listing.context);
                }
            }

            "switch" => {
                let owner = tri!(self.owner(args.first()));
                let profile_id = tri!(self.profile(owner, args.get(1)).await?);

                match tri!(self.handle.switch(owner, profile_id).await?) {
                    SwitchOutcome::Applied(report) => info!("switched, sent to {} observers", report.delivered),
                    SwitchOutcome::Pending => info!("resolving skin, the switch completes shortly"),
                }
            }

            "reset" => {
                let owner = tri!(self.owner(args.first()));
                let report = tri!(self.handle.reset(owner).await?);
                info!("identity reset, sent to {} observers", report.delivered);
            }

            "status" => {
                let status = self.handle.status().await?;
                match status.revision {
                    Some(revision) => info!("revision: {revision} (protocol {})", revision.protocol_version()),
                    None => info!("revision: unsupported, character profiles disabled"),
                }

                info!(
                    "{} online, {} cached textures, {} lookups in progress{}",
                    status.online,
                    status.cached_textures,
                    status.pending_lookups,
                    if status.unsaved_changes { ", unsaved changes" } else { "" }
                );
            }

            _ => warn!("unknown command {command}, type `help` for a list of commands"),
        }

        Ok(Ok(()))
    }
}
