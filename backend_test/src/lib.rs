use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies.
///
/// The server under test runs over volatile in-memory persistence with the
/// example config, so every test starts from an empty campaign collection.
///
/// Injectable dependencies are a [`rocket::local::asynchronous::Client`]
/// (declared as `Client`) and a session cookie (declared as `Cookie`). The
/// cookie belongs to an admin with `#[backend_test(admin)]` and to the voter
/// `"voter-1"` with `#[backend_test(voter)]`.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Work out which session to mint, if any.
    let role = parse_macro_input!(args as Option<Ident>);
    let session = match role {
        Some(ref arg) if arg == "admin" => quote! {
            crate::api::test_utils::session::<crate::model::api::auth::Admin>(&rocket_client, "admin")
        },
        Some(ref arg) if arg == "voter" => quote! {
            crate::api::test_utils::session::<crate::model::api::auth::Voter>(&rocket_client, "voter-1")
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `admin` or `voter`")
                .into_compile_error()
                .into();
        }
        None => quote! {
            rocket::http::Cookie::named(crate::model::api::auth::AUTH_TOKEN_COOKIE)
        },
    };

    // Extract the parameters to inject and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    quote! {
        #[rocket::async_test]
        async fn #name() {
            /// The test itself.
            #item_fn

            let persistence = std::sync::Arc::new(crate::model::persistence::MemoryPersistence::new());
            let config = crate::Config::example();
            let store = crate::model::store::CampaignStore::open(persistence, config.policy(), false)
                .await
                .unwrap();
            let rocket_client = rocket::local::asynchronous::Client::tracked(crate::rocket_for_store(config, store))
                .await
                .unwrap();
            #[allow(unused_variables)]
            let session_cookie = #session;

            #new_name(#(#test_args),*).await;
        }
    }
    .into()
}

/// Ensure the wrapped test is async and extract the parameters to inject.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_cookie = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    let type_ident = &type_path.path.segments.last().unwrap().ident;
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "Cookie" {
                        if has_cookie {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one session `Cookie`",
                            ));
                        }
                        has_cookie = true;
                        args.push(quote! { session_cookie.clone() });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `cookie_ident: Cookie<'static>`",
        ));
    }

    Ok(args)
}
