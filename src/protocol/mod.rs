//! Client/server protocol with homomorphically delivered hints
//!
//! ```text
//! Client                                       Server
//! ------                                       ------
//! secret s, outer key, Enc(s)
//! qu = A·s + e + Δ·u_col
//!        ── QueryWithEncryptedSecret ──►
//!                                              ans = Db·qu
//!                                              Enc(H_i·s) for every digit i
//!        ◄──────── ServerResponse ──────
//! H·s = Σ B^i Dec(Enc(H_i·s))
//! decode(ans - H·s)
//! ```

mod client;
mod messages;
mod secret;
mod server;

pub use client::Client;
pub use messages::{HintAnswer, QueryWithEncryptedSecret, ServerResponse, SizeReport};
pub use secret::{encrypt_secret, generate_and_encrypt, Derivation, EncryptedSecret, Secret};
pub use server::Server;
