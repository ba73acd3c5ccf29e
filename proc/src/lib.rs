use darling::FromDeriveInput;
use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{self, parse_macro_input};

#[derive(FromDeriveInput, Default)]
#[darling(default, attributes(kernel))]
struct KernelOpts {
    kernel: Option<syn::Expr>,
}

#[proc_macro_derive(KernelFunctions, attributes(kernel))]
pub fn kernel_functions_derive(input: TokenStream) -> TokenStream {
    // Construct a representation of the code as a syntax tree to manipulate
    let ast = parse_macro_input!(input);
    let opts = KernelOpts::from_derive_input(&ast)
        .expect("Wrong options for KernelFunctions derive macro");

    if let Some(kernel) = opts.kernel.as_ref() {
        match kernel {
            syn::Expr::Field(_) => (),
            _ => panic!("kernel attribute must be a struct field access"),
        }
    }

    // Build the trait implementation
    impl_kernel_functions_macro(ast, opts)
}

fn kernel_expr(opts: KernelOpts) -> syn::Expr {
    opts.kernel
        .unwrap_or_else(|| syn::parse_quote!(self.kernel))
}

fn impl_kernel_functions_macro(ast: syn::DeriveInput, opts: KernelOpts) -> TokenStream {
    let name = &ast.ident;
    let kernel = kernel_expr(opts);

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    quote! {
        impl #impl_generics crate::KernelFunctions for #name #ty_generics #where_clause {
            fn stats(&self) -> crate::Stats {
                #kernel.stats
            }

            fn lower_bound(&self) -> u64 {
                #kernel.lower_bound
            }

            fn upper_bound(&self) -> u64 {
                #kernel.upper_bound
            }

            fn best_model(&self) -> Option<&[crate::types::Literal]> {
                #kernel.best_model.as_deref()
            }

            fn termination(&self) -> Option<crate::Termination> {
                #kernel.termination
            }

            fn attach_logger<L: crate::WriteSolverLog + 'static>(&mut self, logger: L) {
                #kernel.attach_logger(logger)
            }

            fn detach_logger(&mut self) -> Option<Box<dyn crate::WriteSolverLog>> {
                #kernel.detach_logger()
            }

            fn interrupter(&mut self) -> crate::algs::Interrupter {
                #kernel.interrupter()
            }
        }
    }
    .into()
}

#[proc_macro_derive(Solve, attributes(kernel))]
pub fn solve_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input);
    let opts = KernelOpts::from_derive_input(&ast)
        .expect("Wrong options for KernelFunctions derive macro");

    if let Some(kernel) = opts.kernel.as_ref() {
        match kernel {
            syn::Expr::Field(_) => (),
            _ => panic!("kernel attribute must be a struct field access"),
        }
    }

    // Build the trait implementation
    impl_solve_macro(ast, opts)
}

fn impl_solve_macro(mut ast: syn::DeriveInput, opts: KernelOpts) -> TokenStream {
    let name = &ast.ident;

    // Check whether type has generic named O that is assumed to be the oracle
    let mut found_oracle = false;
    for gen in ast.generics.type_params() {
        if gen.ident == "O" {
            found_oracle = true;
            break;
        }
    }
    if !found_oracle {
        panic!("Solve derive needs a generic for the oracle type called 'O'")
    }

    let kernel = kernel_expr(opts);

    let obounds: syn::WhereClause = syn::parse_quote!(where O: crate::oracle::Oracle);
    ast.generics
        .make_where_clause()
        .predicates
        .extend(obounds.predicates);

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    quote! {
        impl #impl_generics crate::Solve for #name #ty_generics #where_clause {
            fn solve(&mut self, limits: crate::Limits) -> anyhow::Result<crate::Outcome> {
                #kernel.start_solving(limits);
                self.alg_main()
            }
        }
    }
    .into()
}
