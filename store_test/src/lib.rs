use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Turn a test into one that runs against freshly written example files,
/// injects dependencies, and removes the files regardless of how the test
/// terminates.
///
/// Injectable dependencies are `FileStores`, `AdminGate` and `Config`, matched
/// by type name. Pass `voted` as the attribute argument to have the example
/// voter cast a ballot before the test body runs.
#[proc_macro_attribute]
pub fn store_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract injectable parameters and reject invalid function signatures.
    let (arg_idents, arg_values) = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the inner function so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_inner", name);
    item_fn.sig.ident = new_name.clone();

    // Pre-cast a ballot if asked to.
    let maybe_vote = match parse_macro_input!(args as Option<Ident>) {
        Some(arg) if arg == "voted" => quote! {
            crate::model::db::BallotLedger::append(
                &mut config.stores().ledger,
                &crate::model::ballot::BallotEntry::example(),
            )
            .unwrap();
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected no argument or `voted`")
                .into_compile_error()
                .into();
        }
        None => quote! {},
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// The test itself.
            #item_fn

            log4rs_test_utils::test_logging::init_logging_once_for(["ballot_box"], None, None);

            // Test setup.
            let dir = tempfile::TempDir::new().unwrap();
            let config = crate::config::Config::in_dir(dir.path());
            crate::write_example_files(&config);
            #maybe_vote

            // Run the test, catching any panics.
            let result = std::panic::catch_unwind(|| {
                #(
                    let #arg_idents = #arg_values;
                )*
                #new_name(#(#arg_idents),*);
            });

            // Test cleanup.
            dir.close().unwrap();

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::resume_unwind(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is synchronous, and work out how to build each parameter.
fn check_sig(sig: Signature) -> Result<(Vec<Ident>, Vec<TokenStream2>), syn::Error> {
    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "Test must not be `async`",
        ));
    }

    let mut idents = vec![];
    let mut values = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(pat_ident) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    let type_ident = &type_path.path.segments.last().unwrap().ident;
                    let value = if type_ident == "FileStores" {
                        Some(quote! { config.stores() })
                    } else if type_ident == "AdminGate" {
                        Some(quote! { config.admin_gate().unwrap() })
                    } else if type_ident == "Config" {
                        Some(quote! { config.clone() })
                    } else {
                        None
                    };
                    if let Some(value) = value {
                        idents.push(pat_ident.ident.clone());
                        values.push(value);
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `stores: FileStores`, `gate: AdminGate` or `config: Config`",
        ));
    }

    Ok((idents, values))
}
