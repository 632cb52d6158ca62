//! Bridge binaries that expose `openclaw-core` to a calling process as a
//! single-shot JSON command: read one `{command, args}` request from
//! stdin, run it against the knowledge graph or nudge engine, write one
//! `{success, ...}` response to stdout, exit.

pub mod dispatcher;
pub mod kg_commands;
pub mod nudge_commands;
