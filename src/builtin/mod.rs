/*!
The special forms and procedures a [`SchemyContext`](crate::SchemyContext)
starts with.

Special forms are always installed. The procedure library is only
installed by [`SchemyContext::new`](crate::SchemyContext::new); a context
made with
[`SchemyContext::without_builtins`](crate::SchemyContext::without_builtins)
leaves that vocabulary to the host.

## Special forms

| Name                       | Details                                              |
|----------------------------|------------------------------------------------------|
| `quote`                    |                                                      |
| `quasiquote`               | with `unquote` and `unquote-splicing`, nestable      |
| `if`                       | a missing else-branch yields `()`                    |
| `cond`                     | `else` and `=>` clauses                              |
| `case`                     | keys are compared with `eqv?`; `else` and `=>`       |
| `and`, `or`                |                                                      |
| `begin`                    |                                                      |
| `let`                      | including named `let`                                |
| `let*`, `letrec`           |                                                      |
| `do`                       |                                                      |
| `lambda`                   | proper and dotted parameter lists                    |
| `define`                   | top level and at the start of bodies only            |
| `set!`                     |                                                      |
| `time`                     | prints the elapsed time                              |

`trace` and `untrace` are recognized at top level only.

## Equivalence and booleans

`eq?`, `eqv?`, `equal?`, `not`, `boolean?`

## Procedures and control

`procedure?`, `apply`, `map`, `for-each`, `call-with-current-continuation`,
`call/cc`, `error`

## Pairs and lists

`cons`, `car`, `cdr`, `set-car!`, `set-cdr!`, the `c[ad]r` compositions
up to four levels deep (`cadr`, `caddr`, `cadddr`, ...), `pair?`, `null?`,
`list?`, `list`, `list*`, `length`, `last`, `append`, `nconc`, `reverse`,
`nreverse`, `list-tail`, `nthcdr`, `list-ref`, `nth`, `memq`, `memv`,
`member`, `assq`, `assv`, `assoc`

`nconc` and `nreverse` reuse the pairs of their arguments. `nthcdr` and
`nth` take the index first.

## Symbols

`symbol?`, `symbol->string`, `string->symbol`, `gensym`, `get`, `put`

## Numbers

`+`, `-`, `*`, `/`, `=`, `<`, `>`, `<=`, `>=`, `quotient`, `remainder`,
`modulo`, `abs`, `min`, `max`, `gcd`, `lcm`, `expt`, `sqrt`, `exp`, `log`,
`sin`, `cos`, `tan`, `asin`, `acos`, `atan`, `floor`, `ceiling`,
`truncate`, `round`, `random`, `number?`, `integer?`, `zero?`,
`positive?`, `negative?`, `odd?`, `even?`, `number->string`,
`string->number`

Integers are `i64` and overflow is an error, `expt` included. `/` stays
exact only when the division has no remainder. The rounding procedures
return integers.

## Strings and characters

`string?`, `make-string`, `string`, `string-length`, `string-append`,
`string-ref`, `string-set!`, `substring`, `string->list`, `list->string`,
`char?`, `char-alphabetic?`, `char-numeric?`, `char-whitespace?`,
`char-upper-case?`, `char-lower-case?`, `char-upcase`, `char-downcase`,
`char->integer`, `integer->char`

Comparisons come in `=?`, `<?`, `>?`, `<=?` and `>=?` forms for
`string`, `string-ci`, `char` and `char-ci`.

## Vectors

`vector`, `vector?`, `make-vector`, `vector-length`, `vector-ref`,
`vector-set!`, `vector->list`, `list->vector`

## Output

`display`, `write`, `newline`
*/

pub(crate) mod forms;
pub(crate) mod functions;
