//! Rules derived from BuildKit stage semantics rather than hadolint's
//! catalog. Note that several `buildkit/*` codes (`DuplicateStageName`,
//! `ReservedStageName`, `MultipleInstructionsDisallowed`, `DL3043`,
//! `InstructionOrder`) are *construction issues* emitted directly by the
//! semantic builder, not `Rule` impls — they're diagnosed while the
//! model is being built, before any rule runs. Only genuinely
//! post-construction checks live here.

pub mod no_unreachable_stages;
