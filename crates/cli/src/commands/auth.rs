//! Sign in and out of the customer, vendor and admin sessions.
//!
//! # Usage
//!
//! ```bash
//! hoe auth login -e shopper@example.com
//! hoe auth login --as vendor -e seller@example.com
//! hoe auth register -n "Asha Rao" -e asha@example.com --phone 9876543210
//! hoe auth whoami
//! hoe auth logout --as admin
//! ```
//!
//! The password is read from `HOE_PASSWORD` or prompted for.

use clap::{Args, Subcommand};
use hoe_storefront::auth::{Credentials, Registration};
use hoe_storefront::session::TokenNamespace;
use secrecy::SecretString;
use tracing::instrument;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in
    Login {
        #[command(flatten)]
        session: SessionArg,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when not set)
        #[arg(long, env = "HOE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create a customer or vendor account
    Register {
        #[command(flatten)]
        session: SessionArg,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when not set)
        #[arg(long, env = "HOE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Mobile number
        #[arg(long)]
        phone: Option<String>,

        /// Store name (vendors only)
        #[arg(long)]
        store_name: Option<String>,
    },
    /// Sign out of one session
    Logout {
        #[command(flatten)]
        session: SessionArg,
    },
    /// Show who is signed in
    Whoami {
        /// Only check this session
        #[arg(long = "as")]
        namespace: Option<TokenNamespace>,
    },
}

#[derive(Args)]
pub struct SessionArg {
    /// Session to use (`customer`, `vendor`, `admin`)
    #[arg(long = "as", default_value = "customer")]
    pub namespace: TokenNamespace,
}

pub async fn run(ctx: &Context, action: AuthAction) -> Result<(), CommandError> {
    match action {
        AuthAction::Login {
            session,
            email,
            password,
        } => login(ctx, session.namespace, &email, password).await,
        AuthAction::Register {
            session,
            name,
            email,
            password,
            phone,
            store_name,
        } => {
            let registration = Registration {
                name,
                email,
                password: SecretString::from(password_or_prompt(password)?),
                phone,
                store_name,
            };
            register(ctx, session.namespace, &registration).await
        }
        AuthAction::Logout { session } => {
            ctx.storefront.auth().logout(session.namespace)?;
            output::message(&format!("Signed out of the {} session.", session.namespace));
            Ok(())
        }
        AuthAction::Whoami { namespace } => whoami(ctx, namespace).await,
    }
}

#[instrument(skip(ctx, password))]
async fn login(
    ctx: &Context,
    namespace: TokenNamespace,
    email: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let credentials = Credentials::new(email, password_or_prompt(password)?)?;
    let auth = ctx.storefront.auth();
    let user = match auth.login(namespace, &credentials).await? {
        Some(user) => user,
        None => auth.me(namespace).await?,
    };
    output::message(&format!("Signed in as {} ({namespace}).", user.name));
    Ok(())
}

async fn register(
    ctx: &Context,
    namespace: TokenNamespace,
    registration: &Registration,
) -> Result<(), CommandError> {
    let auth = ctx.storefront.auth();
    let user = auth.register(namespace, registration).await?;
    let name = user.map_or_else(|| registration.name.clone(), |u| u.name);
    output::message(&format!("Account created for {name} ({namespace})."));
    if !auth.is_signed_in(namespace) {
        output::message(&format!("Run `hoe auth login --as {namespace}` to sign in."));
    }
    Ok(())
}

async fn whoami(ctx: &Context, only: Option<TokenNamespace>) -> Result<(), CommandError> {
    let auth = ctx.storefront.auth();
    let namespaces = only.map_or_else(|| TokenNamespace::ALL.to_vec(), |ns| vec![ns]);
    let mut any = false;
    for namespace in namespaces {
        if !auth.is_signed_in(namespace) {
            continue;
        }
        any = true;
        match auth.me(namespace).await {
            Ok(user) => output::user(namespace, &user),
            // An expired token has just been cleared; report it and go on.
            Err(err) => output::message(&format!(
                "{namespace:<8} {}",
                CommandError::from(err).user_message()
            )),
        }
    }
    if !any {
        output::message("Not signed in.");
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String, CommandError> {
    match password {
        Some(password) => Ok(password),
        None => Ok(output::ask("Password")?),
    }
}
