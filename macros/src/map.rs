use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse::{Parse, ParseStream},
    parse2,
    punctuated::Punctuated,
    Expr, Ident, Result, Token,
};

enum ArgType {
    Reference,
    Value,
}

struct Arg {
    ty: ArgType,
    ident: Ident,
}

impl Parse for Arg {
    fn parse(input: ParseStream) -> Result<Self> {
        let ty = if input.peek(Token![&]) {
            input.parse::<Token![&]>()?;
            ArgType::Reference
        } else {
            ArgType::Value
        };
        let ident = input.parse()?;
        Ok(Arg { ty, ident })
    }
}

struct Map {
    args: Vec<Arg>,
    body: Expr,
}

impl Parse for Map {
    fn parse(input: ParseStream) -> Result<Self> {
        input.parse::<Token! {|}>()?;
        let args = Punctuated::<Arg, Token![,]>::parse_separated_nonempty(input)?;
        input.parse::<Token! {|}>()?;
        let body = input.parse()?;
        Ok(Map {
            args: args.into_iter().collect(),
            body,
        })
    }
}

pub fn map(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let output = match map_int(input.into()) {
        Ok(output) => output,
        Err(e) => e.to_compile_error(),
    };
    proc_macro::TokenStream::from(output)
}

/// Expands `|a, &b| body` into a lazy `Memo` that forces `a` and `b` (in argument order) and then
/// evaluates `body`. The first input error is returned without evaluating the rest.
pub fn map_int(input: TokenStream) -> Result<TokenStream> {
    let map: Map = parse2(input)?;
    let identifiers: Vec<_> = map.args.iter().map(|a| &a.ident).collect();
    let getters = map.args.iter().map(|a| {
        let ident = &a.ident;
        let guard = format_ident!("__{}_forced", ident);
        let force = quote! {
            let #guard = match #ident.try_force() {
                ::core::result::Result::Ok(value) => value,
                ::core::result::Result::Err(e) => return ::core::result::Result::Err(e),
            };
        };
        match a.ty {
            ArgType::Reference => quote! {
                #force
                let #ident = &*#guard;
            },
            ArgType::Value => quote! {
                let #ident = {
                    #force
                    ::core::clone::Clone::clone(&*#guard)
                };
            },
        }
    });
    let body = &map.body;

    Ok(quote! {
        {
            #(let #identifiers = #identifiers.clone();)*
            ::memogrid::Memo::fallible(move || {
                #(#getters)*
                ::core::result::Result::Ok(#body)
            })
        }
    })
}
